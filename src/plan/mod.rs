pub mod dedup;
pub mod frames;
