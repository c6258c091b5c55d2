use crate::{
    foundation::{
        core::{Fps, FrameIndex, Size, ceil_frames},
        error::{DynresError, DynresResult},
    },
    instructions::table::InterpolationTable,
};

/// One output frame and the size it is scaled to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlanEntry {
    /// Position in playback order.
    pub index: FrameIndex,
    /// Interpolated target size.
    pub size: Size,
}

/// Target size for every output frame, in playback order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameSizePlan {
    entries: Vec<FramePlanEntry>,
}

impl FrameSizePlan {
    /// One entry per source frame: `ceil(fps * duration)` frames sampled at `i / fps`.
    pub fn for_video(
        table: &InterpolationTable,
        fps: Fps,
        duration_sec: f64,
    ) -> DynresResult<Self> {
        check_duration(duration_sec)?;
        let count = fps.secs_to_frames_ceil(duration_sec);
        Self::sample(table, fps, count, None)
    }

    /// `ceil(fps * duration * loops)` frames; sample time wraps modulo `duration` so every loop
    /// replays the same size sequence.
    pub fn for_loop(
        table: &InterpolationTable,
        fps: Fps,
        duration_sec: f64,
        loops: f64,
    ) -> DynresResult<Self> {
        check_duration(duration_sec)?;
        if !loops.is_finite() || loops <= 0.0 {
            return Err(DynresError::invalid_input(format!(
                "loop count must be > 0, got {loops}"
            )));
        }
        let count = ceil_frames(duration_sec * fps.as_f64() * loops);
        Self::sample(table, fps, count, Some(duration_sec))
    }

    fn sample(
        table: &InterpolationTable,
        fps: Fps,
        count: u64,
        wrap: Option<f64>,
    ) -> DynresResult<Self> {
        let mut entries = Vec::with_capacity(count.min(1 << 20) as usize);
        for i in 0..count {
            let mut t = fps.frames_to_secs(i);
            if let Some(period) = wrap {
                t %= period;
            }
            entries.push(FramePlanEntry {
                index: FrameIndex(i),
                size: table.size_at(t)?,
            });
        }
        Ok(Self { entries })
    }

    pub fn from_sizes(sizes: impl IntoIterator<Item = Size>) -> Self {
        Self {
            entries: sizes
                .into_iter()
                .enumerate()
                .map(|(i, size)| FramePlanEntry {
                    index: FrameIndex(i as u64),
                    size,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[FramePlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sizes(&self) -> impl Iterator<Item = Size> + '_ {
        self.entries.iter().map(|e| e.size)
    }
}

fn check_duration(duration_sec: f64) -> DynresResult<()> {
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(DynresError::invalid_input(format!(
            "duration must be > 0 seconds, got {duration_sec}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plan/frames.rs"]
mod tests;
