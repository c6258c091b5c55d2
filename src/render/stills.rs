use std::path::Path;

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::{
    foundation::{
        core::{FrameIndex, Size},
        error::{DynresError, DynresResult},
    },
    media::staging::Staging,
    plan::{dedup::DedupCache, frames::FrameSizePlan},
    render::encode_pool::{EncodePool, Progress},
    session::cancel::CancellationToken,
};

/// Straight RGBA fill for synthetic frames: fully transparent, with a neutral grey colour.
pub const TRANSPARENT_FILL: [u8; 4] = [54, 57, 63, 0];

/// Write one fully transparent RGBA PNG of `size`.
pub fn write_transparent_still(path: &Path, size: Size) -> DynresResult<()> {
    let img = image::RgbaImage::from_pixel(size.width, size.height, image::Rgba(TRANSPARENT_FILL));
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Materialize one transparent still per canonical size, named by canonical index.
#[tracing::instrument(skip_all, fields(stills = cache.len()))]
pub fn materialize_transparent(
    staging: &Staging,
    cache: &DedupCache,
    pool: &EncodePool,
    cancel: &CancellationToken,
) -> DynresResult<()> {
    tracing::info!("creating transparent images");
    let jobs: Vec<(FrameIndex, Size)> = cache
        .canonical_sizes()
        .iter()
        .enumerate()
        .map(|(i, &size)| (FrameIndex(i as u64), size))
        .collect();

    pool.for_each(&jobs, Some(cancel), |&(idx, size)| {
        write_transparent_still(&staging.frame_image(idx), size)
    })
}

/// Resize the extracted still for `idx` to `size` with a Lanczos3 filter, overwriting it.
pub fn resize_in_place(path: &Path, idx: FrameIndex, size: Size) -> DynresResult<()> {
    if !path.exists() {
        return Err(DynresError::missing_frame(idx, path));
    }
    let img = image::open(path).with_context(|| format!("decode '{}'", path.display()))?;
    if img.width() == size.width && img.height() == size.height {
        return Ok(());
    }
    let resized = img.resize_exact(size.width, size.height, FilterType::Lanczos3);
    resized
        .save(path)
        .with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

/// Resize every extracted frame to its planned size.
///
/// Each index is independent, so the pass runs on the pool; it stays interruptible.
#[tracing::instrument(skip_all, fields(frames = plan.len()))]
pub fn resize_frames(
    staging: &Staging,
    plan: &FrameSizePlan,
    pool: &EncodePool,
    cancel: &CancellationToken,
) -> DynresResult<()> {
    tracing::info!("scaling images");
    let progress = Progress::new("scale", plan.len() as u64);
    pool.for_each(plan.entries(), Some(cancel), |entry| {
        resize_in_place(&staging.frame_image(entry.index), entry.index, entry.size)?;
        progress.tick(entry.index);
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/stills.rs"]
mod tests;
