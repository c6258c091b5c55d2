use crate::foundation::error::{DynresError, DynresResult};

/// Zero-based position of a frame in playback order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame rate as a rational `num / den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds).
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> DynresResult<Self> {
        if den == 0 {
            return Err(DynresError::invalid_input("fps den must be > 0"));
        }
        if num == 0 {
            return Err(DynresError::invalid_input("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Integral rates map to `n/1`; anything else keeps three decimals (`29.97` -> `29970/1000`).
    pub fn from_f64(fps: f64) -> DynresResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DynresError::invalid_input(format!(
                "fps must be a positive number, got {fps}"
            )));
        }
        if fps.fract() == 0.0 && fps <= f64::from(u32::MAX) {
            return Self::new(fps as u32, 1);
        }
        let scaled = (fps * 1000.0).round();
        if scaled < 1.0 || scaled > f64::from(u32::MAX) {
            return Err(DynresError::invalid_input(format!("fps {fps} is out of range")));
        }
        Self::new(scaled as u32, 1000)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// `ceil(secs * fps)`, ignoring float noise below 1e-9 of a frame.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        ceil_frames(secs * self.as_f64())
    }

    /// Rate in the `num/den` form ffmpeg accepts for `-framerate` and the `fps` filter.
    pub fn to_ffmpeg_rate(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

pub(crate) fn ceil_frames(frames: f64) -> u64 {
    (frames - 1e-9).ceil().max(0.0) as u64
}

/// Pixel dimensions of one output frame. Both sides are always >= 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
