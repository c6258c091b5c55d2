use crate::{
    foundation::{
        core::Size,
        error::{DynresError, DynresResult},
    },
    instructions::schema::Instructions,
};

/// A keyframe with its time and size fully resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedKeyframe {
    /// Seconds from the start of the media.
    pub time: f64,
    /// Target width in pixels, already truncated.
    pub width: f64,
    /// Target height in pixels, already truncated.
    pub height: f64,
}

/// Native properties of the source the instructions are resolved against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceDims {
    /// Base for `scale`/`wScale`.
    pub width: u32,
    /// Base for `scale`/`hScale`.
    pub height: u32,
    /// Value of an `"end"` keyframe time.
    pub duration_sec: f64,
}

/// Time-ordered keyframes answering "target size at time t".
///
/// Built once per run and read-only afterwards.
#[derive(Clone, Debug)]
pub struct InterpolationTable {
    keys: Vec<ResolvedKeyframe>, // strictly increasing by time
}

impl InterpolationTable {
    pub fn build(instructions: &Instructions, source: SourceDims) -> DynresResult<Self> {
        let raw = instructions.keyframes()?;

        let mut keys = Vec::with_capacity(raw.len());
        for (idx, kf) in raw.iter().enumerate() {
            let time = kf.key_time(idx)?.resolve(source.duration_sec);
            let (width, height) = kf.size_spec(idx)?.resolve(source.width, source.height);
            let width = check_dim(idx, "width", width)?;
            let height = check_dim(idx, "height", height)?;
            keys.push(ResolvedKeyframe {
                time,
                width,
                height,
            });
        }

        Self::from_keyframes(keys)
    }

    /// Sorts by time and rejects tables that cannot interpolate.
    pub fn from_keyframes(mut keys: Vec<ResolvedKeyframe>) -> DynresResult<Self> {
        if keys.len() < 2 {
            return Err(DynresError::invalid_instructions(format!(
                "at least two keyframes are required to interpolate, got {}",
                keys.len()
            )));
        }
        if keys.iter().any(|k| !k.time.is_finite() || k.time < 0.0) {
            return Err(DynresError::invalid_instructions(
                "keyframe times must be finite and >= 0",
            ));
        }

        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(w) = keys.windows(2).find(|w| w[0].time == w[1].time) {
            return Err(DynresError::invalid_instructions(format!(
                "two keyframes resolve to the same time {}s",
                w[0].time
            )));
        }

        Ok(Self { keys })
    }

    pub fn keyframes(&self) -> &[ResolvedKeyframe] {
        &self.keys
    }

    pub fn first_time(&self) -> f64 {
        self.keys[0].time
    }

    pub fn last_time(&self) -> f64 {
        self.keys[self.keys.len() - 1].time
    }

    /// Linear blend between the bracketing keyframes, truncated toward zero and clamped to 1px.
    ///
    /// `prev` is the last key with `time <= t`, `next` the first with `time > t`. Times before the
    /// first key or at/after the last key have no bracket and fail.
    pub fn size_at(&self, t: f64) -> DynresResult<Size> {
        let idx = self.keys.partition_point(|k| k.time <= t);
        if idx == 0 || idx >= self.keys.len() {
            return Err(DynresError::InterpolationOutOfRange {
                t,
                first: self.first_time(),
                last: self.last_time(),
            });
        }

        let prev = &self.keys[idx - 1];
        let next = &self.keys[idx];
        let mult = (t - prev.time) / (next.time - prev.time);

        Ok(Size {
            width: blend(prev.width, next.width, mult),
            height: blend(prev.height, next.height, mult),
        })
    }
}

fn blend(a: f64, b: f64, mult: f64) -> u32 {
    let v = (a + mult * (b - a)).trunc();
    v.clamp(1.0, f64::from(u32::MAX)) as u32
}

fn check_dim(idx: usize, name: &str, v: Option<f64>) -> DynresResult<f64> {
    match v {
        None => Err(DynresError::invalid_instructions(format!(
            "keyframe {idx} leaves {name} undefined"
        ))),
        Some(v) if !v.is_finite() || v < 0.0 => Err(DynresError::invalid_instructions(format!(
            "keyframe {idx} resolves {name} to {v}; expected a finite value >= 0"
        ))),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/instructions/table.rs"]
mod tests;
