//! Everything that touches external processes or the filesystem staging area.

/// System `ffmpeg`/`ffprobe` implementation of [`tools::MediaTools`].
pub mod ffmpeg;
/// Run-scoped staging directory.
pub mod staging;
/// Narrow collaborator interface for media I/O.
pub mod tools;
