use std::path::{Path, PathBuf};

use crate::foundation::{
    core::{Fps, FrameIndex},
    error::DynresResult,
};

/// Native properties of an input video, as reported by the metadata collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Source frame rate; extraction samples at this rate.
    pub fps: Fps,
    /// Video stream duration, or the container duration when the stream has none.
    pub duration_sec: f64,
    /// At least one audio stream is present.
    pub has_audio: bool,
}

/// One unit of encode work: a still image turned into a single-frame segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentJob {
    /// Canonical frame index the segment is named after.
    pub index: FrameIndex,
    /// Source still (`frame-{i}.png`).
    pub image: PathBuf,
    /// Destination segment (`frame-{i}.webm`).
    pub segment: PathBuf,
    /// Frame rate written into the segment.
    pub fps: Fps,
    /// Keep the alpha channel (transparent mode).
    pub alpha: bool,
}

/// External media collaborators, one method each.
///
/// All calls block until the underlying operation finishes. Implementations must be shareable
/// across encode workers; `encode_segment` is called concurrently for distinct indices.
pub trait MediaTools: Send + Sync {
    /// Width, height, frame rate, duration and audio presence of `input`.
    fn probe(&self, input: &Path) -> DynresResult<MediaInfo>;

    /// Write one still per frame at `fps`, named by `pattern` (`%d` starting at 0).
    fn extract_frames(&self, input: &Path, fps: Fps, pattern: &Path) -> DynresResult<()>;

    fn encode_segment(&self, job: &SegmentJob) -> DynresResult<()>;

    /// Stream-copy the segments listed in `list` (in order) into `out`.
    fn concat_segments(&self, list: &Path, out: &Path) -> DynresResult<()>;

    fn extract_audio(&self, input: &Path, out: &Path) -> DynresResult<()>;

    /// Copy the video of `video`, re-encode `audio`, and write the result to `out`.
    fn mux_audio(&self, video: &Path, audio: &Path, out: &Path) -> DynresResult<()>;
}
