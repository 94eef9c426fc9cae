use super::{LoadError, path_string};
use crate::core::geometry::PeriodicBox;
use crate::core::models::topology::{SpeciesReorganization, TopologyError};
use crate::core::rates::RateParameters;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxDimensions {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Global physical conditions, rate constants and per-species reorganization energies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PhysicsParameters {
    /// kT (eV).
    pub thermal_energy: f64,
    /// Field along x (V/nm).
    #[serde(default)]
    pub electric_field: f64,
    #[serde(rename = "box")]
    pub box_dimensions: BoxDimensions,
    pub rates: RateParameters,
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesReorganization>,
}

impl PhysicsParameters {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path_string(path),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| LoadError::Toml {
            path: path_string(path),
            source: e,
        })
    }

    pub fn periodic_box(&self) -> Result<PeriodicBox, LoadError> {
        let d = &self.box_dimensions;
        let pbc = PeriodicBox::new(d.x, d.y, d.z).map_err(TopologyError::from)?;
        Ok(pbc)
    }
}
