//! Per-frame work: stills, the encode pool, and the ordered join.

pub mod concat;
pub mod encode_pool;
pub mod stills;
