//! # Lattice Models
//!
//! Data structures describing the lattice and the mobile particles on it.
//!
//! - [`ids`] - Identifier types for sites, particles and molecular species
//! - [`particle`] - Particle types and the per-particle state machine primitives
//! - [`site`] - Per-site energies, occupancy channels and occupation-time accounting
//! - [`topology`] - The immutable description of the lattice consumed by the engine
//!
//! None of these types reach into each other's state: keeping `Site` occupancy consistent
//! with `Particle` state is the job of [`crate::engine`].

pub mod ids;
pub mod particle;
pub mod site;
pub mod topology;
