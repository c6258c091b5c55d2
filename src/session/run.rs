use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::Fps,
        error::{DynresError, DynresResult},
    },
    instructions::{
        schema::Instructions,
        table::{InterpolationTable, SourceDims},
    },
    media::{staging::Staging, tools::MediaTools},
    plan::{
        dedup::{DedupPlan, SegmentReference},
        frames::FrameSizePlan,
    },
    render::{
        concat::{concatenate, move_file, mux_original_audio},
        encode_pool::{EncodeMode, EncodePool},
        stills::{materialize_transparent, resize_frames},
    },
    session::cancel::CancellationToken,
};

/// Output file name for transparent runs, relative to the working directory.
pub const TRANSPARENT_OUTPUT: &str = "out_resized.webm";

/// Settings shared by both run kinds.
#[derive(Clone, Debug)]
pub struct RunOpts {
    /// Sequential or pooled per-frame work.
    pub encode: EncodeMode,
    /// Scratch location; see [`Staging::create`] for which directories are accepted.
    pub staging_root: PathBuf,
    /// Overrides the derived output path.
    pub output: Option<PathBuf>,
    /// Tripped by the interrupt handler.
    pub cancel: CancellationToken,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            encode: EncodeMode::default(),
            staging_root: Staging::default_root(),
            output: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// Synthetic transparent clip parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TransparentOpts {
    /// Length of one loop in seconds.
    pub duration_sec: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// Base size that `scale`/`wScale`/`hScale` keyframes are relative to.
    pub width: u32,
    /// Base height, see `width`.
    pub height: u32,
    /// Number of times the size sequence plays; fractional counts cut the last loop short.
    pub loops: f64,
}

impl TransparentOpts {
    pub const DEFAULT_FPS: f64 = 30.0;
    pub const DEFAULT_WIDTH: f64 = 500.0;
    pub const DEFAULT_HEIGHT: f64 = 500.0;
    pub const DEFAULT_LOOPS: f64 = 1.0;

    /// Positional `DURATION [FPS] [WIDTH] [HEIGHT] [LOOP]`.
    pub fn from_values(values: &[f64]) -> DynresResult<Self> {
        let (&duration_sec, rest) = values
            .split_first()
            .ok_or_else(|| DynresError::invalid_input("transparent mode needs a duration"))?;
        if rest.len() > 4 {
            return Err(DynresError::invalid_input(format!(
                "transparent mode takes at most 5 values, got {}",
                values.len()
            )));
        }
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(DynresError::invalid_input(format!(
                "duration must be > 0 seconds, got {duration_sec}"
            )));
        }

        let fps = Fps::from_f64(rest.first().copied().unwrap_or(Self::DEFAULT_FPS))?;
        let width = pixel_dim("width", rest.get(1).copied().unwrap_or(Self::DEFAULT_WIDTH))?;
        let height = pixel_dim("height", rest.get(2).copied().unwrap_or(Self::DEFAULT_HEIGHT))?;
        let loops = rest.get(3).copied().unwrap_or(Self::DEFAULT_LOOPS);
        if !loops.is_finite() || loops <= 0.0 {
            return Err(DynresError::invalid_input(format!(
                "loop count must be > 0, got {loops}"
            )));
        }

        Ok(Self {
            duration_sec,
            fps,
            width,
            height,
            loops,
        })
    }
}

fn pixel_dim(name: &str, v: f64) -> DynresResult<u32> {
    let t = v.trunc();
    if !t.is_finite() || t < 1.0 || t > f64::from(u32::MAX) {
        return Err(DynresError::invalid_input(format!(
            "{name} must be >= 1 pixel, got {v}"
        )));
    }
    Ok(t as u32)
}

/// What a finished run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Final webm path.
    pub output: PathBuf,
    /// Frames in the output, in playback order.
    pub frames_total: u64,
    /// Distinct segments encoded; equals `frames_total` in video mode.
    pub segments_encoded: u64,
}

/// Accepts existing `.mp4` / `.webm` files only.
pub fn validate_input_path(input: &Path) -> DynresResult<()> {
    let ext_ok = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4") || e.eq_ignore_ascii_case("webm"));
    if !ext_ok {
        return Err(DynresError::invalid_input(format!(
            "'{}' is not an .mp4 or .webm file",
            input.display()
        )));
    }
    if !input.is_file() {
        return Err(DynresError::invalid_input(format!(
            "input file '{}' does not exist",
            input.display()
        )));
    }
    Ok(())
}

/// `<dir>/<stem>_resized.webm` next to the input.
pub fn default_video_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    input.with_file_name(format!("{stem}_resized.webm"))
}

fn ensure_parent_dir(path: &Path) -> DynresResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Resize a real video frame by frame and re-attach its audio.
///
/// Phases: probe, plan, extract, scale, encode, concatenate, audio mux. Staging is removed before
/// this returns, on success and on every error.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn render_video(
    tools: &dyn MediaTools,
    input: &Path,
    instructions: &Instructions,
    opts: &RunOpts,
) -> DynresResult<RunReport> {
    validate_input_path(input)?;
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| default_video_output(input));
    let cancel = &opts.cancel;

    let info = tools.probe(input)?;
    tracing::info!(
        width = info.width,
        height = info.height,
        fps = %info.fps.to_ffmpeg_rate(),
        duration_sec = info.duration_sec,
        "probed input"
    );
    if !info.has_audio {
        tracing::warn!("input has no audio stream; the final audio mux will fail");
    }

    let staging = Staging::create(&opts.staging_root)?;

    tracing::info!("reading instructions");
    let table = InterpolationTable::build(
        instructions,
        SourceDims {
            width: info.width,
            height: info.height,
            duration_sec: info.duration_sec,
        },
    )?;
    let plan = FrameSizePlan::for_video(&table, info.fps, info.duration_sec)?;
    cancel.check()?;

    tracing::info!("extracting frames");
    tools.extract_frames(input, info.fps, &staging.frame_image_pattern())?;
    cancel.check()?;

    let pool = EncodePool::new(&opts.encode)?;
    resize_frames(&staging, &plan, &pool, cancel)?;

    let reference = SegmentReference::identity(plan.len());
    let stats = pool.encode_segments(
        tools,
        &staging,
        &reference.distinct_indices(),
        info.fps,
        false,
        cancel,
    )?;

    let silent = concatenate(tools, &staging, &reference)?;
    cancel.check()?;

    ensure_parent_dir(&output)?;
    mux_original_audio(tools, &staging, input, &silent, &output)?;

    drop(staging);
    tracing::info!(output = %output.display(), "done");
    Ok(RunReport {
        output,
        frames_total: plan.len() as u64,
        segments_encoded: stats.segments_encoded,
    })
}

/// Generate a transparent clip of changing size, encoding each distinct size once.
#[tracing::instrument(skip(tools, instructions, opts))]
pub fn render_transparent(
    tools: &dyn MediaTools,
    clip: &TransparentOpts,
    instructions: &Instructions,
    opts: &RunOpts,
) -> DynresResult<RunReport> {
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(TRANSPARENT_OUTPUT));
    let cancel = &opts.cancel;

    let staging = Staging::create(&opts.staging_root)?;

    tracing::info!("reading instructions");
    let table = InterpolationTable::build(
        instructions,
        SourceDims {
            width: clip.width,
            height: clip.height,
            duration_sec: clip.duration_sec,
        },
    )?;
    let plan = FrameSizePlan::for_loop(&table, clip.fps, clip.duration_sec, clip.loops)?;
    let dedup = DedupPlan::build(&plan);
    tracing::info!(
        frames = plan.len(),
        distinct = dedup.cache.len(),
        "planned transparent frames"
    );
    cancel.check()?;

    let pool = EncodePool::new(&opts.encode)?;
    materialize_transparent(&staging, &dedup.cache, &pool, cancel)?;

    let stats = pool.encode_segments(
        tools,
        &staging,
        &dedup.reference.distinct_indices(),
        clip.fps,
        true,
        cancel,
    )?;

    let silent = concatenate(tools, &staging, &dedup.reference)?;
    cancel.check()?;

    ensure_parent_dir(&output)?;
    move_file(&silent, &output)?;

    drop(staging);
    tracing::info!(output = %output.display(), "done");
    Ok(RunReport {
        output,
        frames_total: plan.len() as u64,
        segments_encoded: stats.segments_encoded,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/session/run.rs"]
mod tests;
