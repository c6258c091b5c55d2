//! Keyframe instruction documents and the time-to-size interpolation table built from them.

pub mod schema;
pub mod table;
