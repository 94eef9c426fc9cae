//! # Workflows Module
//!
//! Top-level entry points that turn a loaded system and a configuration into finished runs.
//!
//! - **Single run** ([`run`]) - One seeded trajectory with its recorder
//! - **Batch** ([`batch`]) - Independent runs fanned out over the thread pool (feature `parallel`)
//!
//! Runs never share mutable state; a failed run does not affect the others.

pub mod batch;
pub mod run;
