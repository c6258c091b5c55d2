use std::{fs::File, io::BufReader, path::Path};

use crate::foundation::error::{DynresError, DynresResult};

/// Default instruction document location, relative to the working directory.
pub const DEFAULT_INSTRUCTIONS_PATH: &str = "instructions.json";

/// The instruction document as written by the user.
///
/// Fields are kept optional so that absence can be reported with a precise message instead of a
/// generic deserialization error.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Instructions {
    /// At least two are needed to interpolate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<Vec<RawKeyframe>>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct RawKeyframe {
    /// Seconds as a number, or the string `"end"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<serde_json::Value>,
    /// Target size at `time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeSpec>,
}

/// Target size for one keyframe, relative to the source's native dimensions.
///
/// Resolution order (later wins): `scale`, `wScale`, `hScale`, `width`, `height`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeSpec {
    /// Absolute width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Absolute height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Multiplier for both native dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Multiplier for the native width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w_scale: Option<f64>,
    /// Multiplier for the native height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_scale: Option<f64>,
}

/// Keyframe time before the media duration is known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyTime {
    Seconds(f64),
    End,
}

impl KeyTime {
    pub fn resolve(self, duration_sec: f64) -> f64 {
        match self {
            Self::Seconds(s) => s,
            Self::End => duration_sec,
        }
    }
}

impl Instructions {
    pub fn from_path(path: &Path) -> DynresResult<Self> {
        if !path.exists() {
            return Err(DynresError::invalid_instructions(format!(
                "no instruction file at '{}'",
                path.display()
            )));
        }
        let f = File::open(path).map_err(|e| {
            DynresError::invalid_instructions(format!("open '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            DynresError::invalid_instructions(format!("parse '{}': {e}", path.display()))
        })
    }

    pub fn from_json_str(s: &str) -> DynresResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| DynresError::invalid_instructions(format!("parse instructions: {e}")))
    }

    /// Keyframe list, or `InvalidInstructions` when the document has none.
    pub fn keyframes(&self) -> DynresResult<&[RawKeyframe]> {
        self.keyframes
            .as_deref()
            .ok_or_else(|| DynresError::invalid_instructions("no keyframe data"))
    }
}

impl RawKeyframe {
    pub fn key_time(&self, idx: usize) -> DynresResult<KeyTime> {
        let value = self.time.as_ref().ok_or_else(|| {
            DynresError::invalid_instructions(format!("keyframe {idx} has no time"))
        })?;
        match value {
            serde_json::Value::String(s) if s == "end" => Ok(KeyTime::End),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(t) if t.is_finite() && t >= 0.0 => Ok(KeyTime::Seconds(t)),
                _ => Err(DynresError::invalid_instructions(format!(
                    "keyframe {idx} has invalid time {n}"
                ))),
            },
            other => Err(DynresError::invalid_instructions(format!(
                "keyframe {idx} has invalid time {other}; expected seconds >= 0 or \"end\""
            ))),
        }
    }

    pub fn size_spec(&self, idx: usize) -> DynresResult<&SizeSpec> {
        self.size.as_ref().ok_or_else(|| {
            DynresError::invalid_instructions(format!("keyframe {idx} has no size"))
        })
    }
}

impl SizeSpec {
    /// Resolve against the native size. Products truncate toward zero.
    ///
    /// Returns `(width, height)`; a dimension no field touched is `None`.
    pub fn resolve(&self, native_width: u32, native_height: u32) -> (Option<f64>, Option<f64>) {
        let w0 = f64::from(native_width);
        let h0 = f64::from(native_height);
        let mut w = None;
        let mut h = None;

        if let Some(s) = self.scale {
            w = Some((w0 * s).trunc());
            h = Some((h0 * s).trunc());
        }
        if let Some(s) = self.w_scale {
            w = Some((w0 * s).trunc());
        }
        if let Some(s) = self.h_scale {
            h = Some((h0 * s).trunc());
        }
        if let Some(v) = self.width {
            w = Some(v.trunc());
        }
        if let Some(v) = self.height {
            h = Some(v.trunc());
        }
        (w, h)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/instructions/schema.rs"]
mod tests;
