//! # Rate Laws
//!
//! Closed-form hazard rates for every transition the simulator knows about.
//!
//! - [`laws`] - Pure functions: Miller-Abrahams, Marcus, Förster and unimolecular decay
//! - [`params`] - Physical constants per carrier type, loaded from the parameter file
//! - [`engine`] - [`RateEngine`], which applies the laws to pairs of sites
//!
//! Energies are in eV, distances in nm, fields in V/nm and rates in 1/s. Every law rejects
//! degenerate inputs (zero distance, zero reorganization energy, non-positive kT) with a
//! [`RateError`] instead of producing NaN or infinity.

pub mod engine;
pub mod laws;
pub mod params;

pub use engine::RateEngine;
pub use laws::RateError;
pub use params::{HoppingParameters, RateParameters, TransportModel};
