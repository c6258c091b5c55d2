//! dynres renders webm videos whose frame resolution changes over time.
//!
//! # Pipeline overview
//!
//! 1. **Interpolate**: keyframe instructions become an [`InterpolationTable`] answering
//!    "size at time t".
//! 2. **Plan**: [`FrameSizePlan`] samples the table once per output frame; in transparent mode
//!    [`DedupPlan`] collapses repeated sizes to one canonical frame each.
//! 3. **Stills**: extracted frames are resized in place, or transparent stills are generated.
//! 4. **Encode**: [`EncodePool`] turns each still into a single-frame segment, sequentially or on
//!    a rayon pool.
//! 5. **Join**: segments are concatenated strictly in plan order, then the source audio is
//!    remuxed (video mode).
//!
//! All media I/O goes through the [`MediaTools`] trait; [`FfmpegTools`] is the system-`ffmpeg`
//! implementation.
#![forbid(unsafe_code)]

mod foundation;
mod instructions;
mod media;
mod plan;
mod render;
mod session;

pub use foundation::core::{Fps, FrameIndex, Size};
pub use foundation::error::{DynresError, DynresResult};
pub use instructions::schema::{
    DEFAULT_INSTRUCTIONS_PATH, Instructions, KeyTime, RawKeyframe, SizeSpec,
};
pub use instructions::table::{InterpolationTable, ResolvedKeyframe, SourceDims};
pub use media::ffmpeg::{AUDIO_BITRATE, FfmpegTools, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use media::staging::Staging;
pub use media::tools::{MediaInfo, MediaTools, SegmentJob};
pub use plan::dedup::{DedupCache, DedupPlan, SegmentReference};
pub use plan::frames::{FramePlanEntry, FrameSizePlan};
pub use render::concat::{concat_list, concatenate, move_file, mux_original_audio};
pub use render::encode_pool::{EncodeMode, EncodePool, EncodeStats};
pub use render::stills::{
    TRANSPARENT_FILL, materialize_transparent, resize_frames, resize_in_place,
    write_transparent_still,
};
pub use session::cancel::CancellationToken;
pub use session::run::{
    RunOpts, RunReport, TRANSPARENT_OUTPUT, TransparentOpts, default_video_output, render_transparent,
    render_video, validate_input_path,
};
