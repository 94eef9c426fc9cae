//! # OptoKMC Core Library
//!
//! A kinetic Monte Carlo engine for charge and exciton transport in disordered organic
//! semiconductors. Electrons, holes, singlet and triplet excitons and charge-transfer (CT)
//! states live on the sites of a periodic molecular lattice and hop, decay, recombine and
//! dissociate according to closed-form rate laws.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Site`, `Particle`, `Topology`),
//!   the periodic geometry, the pure rate laws and the immutable `NeighborTable` that holds
//!   every precomputed hazard rate, plus loaders for the tabular input formats.
//!
//! - **[`engine`]: The Logic Core.** The stateful discrete-event machinery: the `EventList`
//!   used for rate-weighted sampling, the particle arena, and the `KmcEngine` that enumerates
//!   enabled transitions, advances the clock and executes the chosen event.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine: a single
//!   seeded run, and a fan-out of independent runs sharing one read-only neighbor table.

pub mod core;
pub mod engine;
pub mod workflows;
