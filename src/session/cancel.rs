use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::foundation::error::{DynresError, DynresResult};

/// Cooperative interrupt flag shared between the signal handler and the pipeline.
///
/// Sequential phases poll it between units of work. The parallel encode pool never polls it:
/// once dispatched, the pool drains before the flag is looked at again.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Interrupted)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> DynresResult<()> {
        if self.is_cancelled() {
            return Err(DynresError::Interrupted);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/cancel.rs"]
mod tests;
