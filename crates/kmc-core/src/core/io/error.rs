use crate::core::models::topology::TopologyError;
use crate::core::neighbors::NeighborTableError;
use crate::core::rates::RateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid record {record} in '{path}': {message}")]
    InvalidRecord {
        path: String,
        record: usize,
        message: String,
    },

    #[error("Molecular species '{0}' has no reorganization energies, required by the Marcus model")]
    UnknownSpecies(String),

    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("Invalid rate parameters: {0}")]
    Rates(#[from] RateError),

    #[error("Failed to build neighbor table: {0}")]
    Neighbors(#[from] NeighborTableError),
}
