//! # Engine Module
//!
//! The discrete-event core of the simulator: it owns the mutable state of one run and
//! advances it one transition at a time.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Seed, initial population, stopping conditions and cadence
//! - **Event List** ([`event_list`]) - Enabled transitions of the current step and their sampling
//! - **Particle Arena** ([`particles`]) - Stable-id storage for a population that grows and shrinks
//! - **Simulation** ([`simulation`]) - Enumeration, time advancement and the run loop
//! - **Transitions** ([`transitions`]) - How every kind of event mutates sites and particles
//! - **Recording** ([`recorder`]) - The output collaborator interface
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Configuration and invariant failures
//!
//! A run is strictly sequential. Independent runs share the topology, rate engine and
//! neighbor table by reference and own everything else.

pub mod config;
pub mod error;
pub mod event_list;
pub mod particles;
pub mod progress;
pub mod recorder;
pub mod simulation;
mod transitions;
pub(crate) mod utils;
