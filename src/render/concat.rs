use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{DynresError, DynresResult},
    media::{staging::Staging, tools::MediaTools},
    plan::dedup::SegmentReference,
};

/// ffmpeg concat-demuxer list, one line per output position, in playback order.
///
/// Paths are relative to the list file, which lives next to the segments.
pub fn concat_list(reference: &SegmentReference) -> String {
    let mut out = String::with_capacity(reference.len() * 24);
    for &idx in reference.positions() {
        out.push_str("file ");
        out.push_str(&Staging::segment_file_name(idx));
        out.push('\n');
    }
    out
}

/// Write the list and join the segments into one silent stream; returns its path.
#[tracing::instrument(skip_all, fields(positions = reference.len()))]
pub fn concatenate(
    tools: &dyn MediaTools,
    staging: &Staging,
    reference: &SegmentReference,
) -> DynresResult<PathBuf> {
    if reference.is_empty() {
        return Err(DynresError::invalid_input("no frames to concatenate"));
    }

    tracing::info!("concatenating webms");
    let list = staging.concat_list();
    std::fs::write(&list, concat_list(reference))
        .with_context(|| format!("write concat list '{}'", list.display()))?;

    let out = staging.silent_video();
    tools.concat_segments(&list, &out)?;
    Ok(out)
}

/// Pull the source's audio track and remux it against the silent video into `out`.
#[tracing::instrument(skip_all, fields(out = %out.display()))]
pub fn mux_original_audio(
    tools: &dyn MediaTools,
    staging: &Staging,
    input: &Path,
    silent_video: &Path,
    out: &Path,
) -> DynresResult<()> {
    tracing::info!("extracting audio");
    let audio = staging.audio_track();
    tools.extract_audio(input, &audio)?;

    tracing::info!("combining video and audio");
    tools.mux_audio(silent_video, &audio, out)
}

/// Move `from` to `to`, copying when a rename cannot cross filesystems.
pub fn move_file(from: &Path, to: &Path) -> DynresResult<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)
        .with_context(|| format!("copy '{}' to '{}'", from.display(), to.display()))?;
    std::fs::remove_file(from).with_context(|| format!("remove '{}'", from.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/concat.rs"]
mod tests;
