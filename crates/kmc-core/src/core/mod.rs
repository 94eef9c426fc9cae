//! # Core Module
//!
//! The stateless foundation of the simulator: everything that is built once from input data
//! and then only read during a run.
//!
//! - **Geometry** ([`geometry`]) - Minimum-image displacements in a rectangular periodic box
//! - **Lattice Models** ([`models`]) - Sites, particles, identifiers and the topology provider
//! - **Rate Laws** ([`rates`]) - Miller-Abrahams, Marcus, Förster/Dexter and decay rates
//! - **Neighbor Table** ([`neighbors`]) - Per-site adjacency with pre-evaluated channel rates
//! - **Input Loading** ([`io`]) - Site tables, pair lists and physical parameter files

pub mod geometry;
pub mod io;
pub mod models;
pub mod neighbors;
pub mod rates;
