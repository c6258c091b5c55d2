use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    core::FrameIndex,
    error::{DynresError, DynresResult},
};

/// Written into every staging directory; its content records whether the directory is ours.
const MARKER: &str = ".dynres-staging";

/// Scratch directory owned by one run.
///
/// Every worker writes index-derived file names, so no locking is needed. Staged files are
/// removed when this value drops, whether the run succeeded, failed, or was interrupted. The
/// directory itself is only removed when this run (or an earlier dynres run) created it; files
/// dynres did not write are never touched.
#[derive(Debug)]
pub struct Staging {
    root: PathBuf,
    owns_root: bool,
}

impl Staging {
    /// Staging area at `root`.
    ///
    /// A missing `root` is created and owned. An existing empty directory is borrowed: staged
    /// files are cleaned up but the directory stays. Leftovers of an earlier dynres run are
    /// cleared first. Any other existing content is `InvalidInput`.
    pub fn create(root: impl Into<PathBuf>) -> DynresResult<Self> {
        let root = root.into();
        let mut owns_root = true;

        if root.exists() {
            if !root.is_dir() {
                return Err(DynresError::invalid_input(format!(
                    "staging path '{}' is not a directory",
                    root.display()
                )));
            }
            let marker = root.join(MARKER);
            owns_root = false;
            if marker.is_file() {
                owns_root = std::fs::read_to_string(&marker)
                    .with_context(|| format!("read '{}'", marker.display()))?
                    .trim()
                    == "owned";
                clear_staged_files(&root)?;
            }
            let leftover = std::fs::read_dir(&root)
                .with_context(|| format!("read staging directory '{}'", root.display()))?
                .next()
                .is_some();
            if leftover {
                return Err(DynresError::invalid_input(format!(
                    "staging directory '{}' is not empty and was not created by dynres",
                    root.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&root)
                .with_context(|| format!("create staging directory '{}'", root.display()))?;
        }

        let marker = root.join(MARKER);
        std::fs::write(&marker, if owns_root { "owned\n" } else { "borrowed\n" })
            .with_context(|| format!("write '{}'", marker.display()))?;
        tracing::debug!(root = %root.display(), owns_root, "staging created");
        Ok(Self { root, owns_root })
    }

    /// Per-process default location under the system temp dir.
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join(format!("dynres-{}", std::process::id()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frame_image(&self, idx: FrameIndex) -> PathBuf {
        self.root.join(format!("frame-{}.png", idx.0))
    }

    /// `%d` pattern matching [`Self::frame_image`], for the extraction collaborator.
    pub fn frame_image_pattern(&self) -> PathBuf {
        self.root.join("frame-%d.png")
    }

    pub fn segment_file_name(idx: FrameIndex) -> String {
        format!("frame-{}.webm", idx.0)
    }

    pub fn segment(&self, idx: FrameIndex) -> PathBuf {
        self.root.join(Self::segment_file_name(idx))
    }

    pub fn concat_list(&self) -> PathBuf {
        self.root.join("concat.txt")
    }

    pub fn silent_video(&self) -> PathBuf {
        self.root.join("out.webm")
    }

    pub fn audio_track(&self) -> PathBuf {
        self.root.join("audio.wav")
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        tracing::info!("cleanup");
        let res = if self.owns_root {
            std::fs::remove_dir_all(&self.root)
        } else {
            remove_staged_files(&self.root)
        };
        if let Err(e) = res
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(root = %self.root.display(), "failed to clean staging directory: {e}");
        }
    }
}

/// Names dynres writes into a staging directory.
fn is_staged_file_name(name: &str) -> bool {
    matches!(name, MARKER | "concat.txt" | "out.webm" | "audio.wav")
        || (name.starts_with("frame-") && (name.ends_with(".png") || name.ends_with(".webm")))
}

fn remove_staged_files(root: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let staged = entry.file_name().to_str().is_some_and(is_staged_file_name);
        if staged && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn clear_staged_files(root: &Path) -> DynresResult<()> {
    remove_staged_files(root)
        .with_context(|| format!("clear stale staging directory '{}'", root.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/media/staging.rs"]
mod tests;
