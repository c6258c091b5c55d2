use std::path::PathBuf;

use crate::foundation::core::FrameIndex;

/// Crate-wide result alias.
pub type DynresResult<T> = Result<T, DynresError>;

/// Every failure is fatal to a run; callers never get partial output.
#[derive(thiserror::Error, Debug)]
pub enum DynresError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid instructions: {0}")]
    InvalidInstructions(String),

    #[error(
        "interpolation out of range: t={t}s is outside keyframe coverage [{first}s, {last}s)"
    )]
    InterpolationOutOfRange {
        /// Query time in seconds.
        t: f64,
        /// First keyframe time.
        first: f64,
        /// Last keyframe time (exclusive).
        last: f64,
    },

    #[error("missing frame: {index} (expected '{}')", .path.display())]
    MissingFrame {
        /// Frame whose artifact is absent.
        index: FrameIndex,
        /// Where it was expected.
        path: PathBuf,
    },

    #[error("external tool failure: {tool}: {detail}")]
    ExternalToolFailure {
        /// Binary that failed (`ffmpeg`, `ffprobe`).
        tool: String,
        /// Exit status and trimmed stderr, or the spawn error.
        detail: String,
    },

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DynresError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_instructions(msg: impl Into<String>) -> Self {
        Self::InvalidInstructions(msg.into())
    }

    pub fn missing_frame(index: FrameIndex, path: impl Into<PathBuf>) -> Self {
        Self::MissingFrame {
            index,
            path: path.into(),
        }
    }

    pub fn external_tool(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
