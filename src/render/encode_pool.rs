use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::{DynresError, DynresResult},
    },
    media::{
        staging::Staging,
        tools::{MediaTools, SegmentJob},
    },
    session::cancel::CancellationToken,
};

/// How per-frame work is scheduled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeMode {
    /// One index at a time, ascending. Avoids running several encoders at once.
    Sequential,
    /// Bounded rayon pool; `threads: None` uses the available parallelism.
    Parallel {
        /// Worker count; must be >= 1 when set.
        threads: Option<usize>,
    },
}

impl Default for EncodeMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Segments written by this pass.
    pub segments_encoded: u64,
}

/// Worker pool for independent per-index jobs (frame resizing and segment encoding).
///
/// Completion order is irrelevant: every job writes an index-named file. The pool returns only
/// after every job succeeded or the first failure stopped new work from being issued.
pub struct EncodePool {
    pool: Option<rayon::ThreadPool>,
}

impl EncodePool {
    pub fn new(mode: &EncodeMode) -> DynresResult<Self> {
        let pool = match mode {
            EncodeMode::Sequential => None,
            EncodeMode::Parallel { threads } => Some(build_thread_pool(*threads)?),
        };
        Ok(Self { pool })
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Run `job` over `items`. `cancel` is polled before each item when given.
    pub fn for_each<T, F>(
        &self,
        items: &[T],
        cancel: Option<&CancellationToken>,
        job: F,
    ) -> DynresResult<()>
    where
        T: Sync,
        F: Fn(&T) -> DynresResult<()> + Send + Sync,
    {
        let run_one = |item: &T| -> DynresResult<()> {
            if let Some(token) = cancel {
                token.check()?;
            }
            job(item)
        };

        match &self.pool {
            None => items.iter().try_for_each(run_one),
            Some(pool) => pool.install(|| items.par_iter().try_for_each(run_one)),
        }
    }

    /// Encode one single-frame segment per index.
    ///
    /// In parallel mode the interrupt flag is only consulted after the pool has drained.
    #[tracing::instrument(skip_all, fields(segments = indices.len(), parallel = self.is_parallel()))]
    pub fn encode_segments(
        &self,
        tools: &dyn MediaTools,
        staging: &Staging,
        indices: &[FrameIndex],
        fps: Fps,
        alpha: bool,
        cancel: &CancellationToken,
    ) -> DynresResult<EncodeStats> {
        if self.is_parallel() {
            tracing::info!("creating webm parts (parallel, interrupts wait for the pool)");
        } else {
            tracing::info!("creating webm parts");
        }

        let progress = Progress::new("encode", indices.len() as u64);
        let poll = if self.is_parallel() {
            None
        } else {
            Some(cancel)
        };

        self.for_each(indices, poll, |&index| {
            let job = SegmentJob {
                index,
                image: staging.frame_image(index),
                segment: staging.segment(index),
                fps,
                alpha,
            };
            if !job.image.exists() {
                return Err(DynresError::missing_frame(index, job.image));
            }
            tools.encode_segment(&job)?;
            progress.tick(index);
            Ok(())
        })?;
        cancel.check()?;

        for &index in indices {
            let segment = staging.segment(index);
            if !segment.exists() {
                return Err(DynresError::missing_frame(index, segment));
            }
        }

        Ok(EncodeStats {
            segments_encoded: indices.len() as u64,
        })
    }
}

/// Completed-item counter that logs roughly every tenth of the work.
pub(crate) struct Progress {
    label: &'static str,
    total: u64,
    step: u64,
    done: AtomicU64,
}

impl Progress {
    pub(crate) fn new(label: &'static str, total: u64) -> Self {
        Self {
            label,
            total,
            step: (total / 10).max(1),
            done: AtomicU64::new(0),
        }
    }

    pub(crate) fn tick(&self, index: FrameIndex) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(label = self.label, %index, "done");
        if done % self.step == 0 || done == self.total {
            tracing::info!("{}: {done} / {}", self.label, self.total);
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> DynresResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(DynresError::invalid_input(
            "worker threads must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("dynres-encode-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| DynresError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode_pool.rs"]
mod tests;
