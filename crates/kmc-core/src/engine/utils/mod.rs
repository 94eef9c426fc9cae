//! Helpers shared by the engine: the per-run random stream.

pub mod sampling;
