//! Loaders for the lattice description consumed by the simulator.
//!
//! A simulated system is assembled from four inputs: a TOML file of physical parameters
//! ([`parameters`]), a CSV site table ([`sites`]) and one or two CSV pair lists ([`pairs`]).
//! [`system::load_system`] reads them all and returns a ready [`system::LoadedSystem`].

pub mod error;
pub mod pairs;
pub mod parameters;
pub mod sites;
pub mod system;

pub use error::LoadError;
pub use system::{LoadedSystem, SystemPaths, load_system};

pub(crate) fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().to_string()
}
