use super::parameters::PhysicsParameters;
use super::{LoadError, path_string};
use crate::core::models::ids::SpeciesId;
use crate::core::models::site::SiteEnergies;
use crate::core::models::topology::{MolecularSpecies, SiteProperties, Topology, TopologyError};
use crate::core::rates::TransportModel;
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One row of the site table: `x,y,z,electron,hole,singlet,triplet,species`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub electron: f64,
    pub hole: f64,
    pub singlet: f64,
    pub triplet: f64,
    pub species: String,
}

pub fn read_sites<R: Read>(reader: R, path: &Path) -> Result<Vec<SiteRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize::<SiteRecord>()
        .map(|result| {
            result.map_err(|e| LoadError::Csv {
                path: path_string(path),
                source: e,
            })
        })
        .collect()
}

pub fn load_sites(path: &Path) -> Result<Vec<SiteRecord>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path_string(path),
        source: e,
    })?;
    read_sites(std::io::BufReader::new(file), path)
}

/// Assembles a [`Topology`] from site rows and physical parameters.
///
/// Species ids are assigned in order of first appearance in the table. Coordinates are wrapped
/// into the periodic box.
pub fn build_topology(
    records: &[SiteRecord],
    physics: &PhysicsParameters,
) -> Result<Topology, LoadError> {
    let periodic_box = physics.periodic_box()?;
    let marcus = physics.rates.transport_model == TransportModel::Marcus;

    let mut species: Vec<MolecularSpecies> = Vec::new();
    let mut ids: HashMap<&str, SpeciesId> = HashMap::new();
    let mut sites = Vec::with_capacity(records.len());

    for record in records {
        let species_id = match ids.get(record.species.as_str()) {
            Some(&id) => id,
            None => {
                let reorganization = physics.species.get(&record.species).copied();
                if marcus && reorganization.is_none() {
                    return Err(LoadError::UnknownSpecies(record.species.clone()));
                }
                let id = SpeciesId::try_from(species.len())
                    .map_err(|_| TopologyError::TooManySpecies(species.len() + 1))?;
                species.push(MolecularSpecies {
                    name: record.species.clone(),
                    reorganization,
                });
                ids.insert(record.species.as_str(), id);
                id
            }
        };

        sites.push(SiteProperties {
            position: periodic_box.wrap(&Point3::new(record.x, record.y, record.z)),
            energies: SiteEnergies {
                electron: record.electron,
                hole: record.hole,
                singlet: record.singlet,
                triplet: record.triplet,
            },
            species: species_id,
        });
    }

    debug!(
        sites = sites.len(),
        species = species.len(),
        "Assembled lattice topology."
    );

    Ok(Topology::new(
        sites,
        species,
        periodic_box,
        physics.thermal_energy,
        physics.electric_field,
    )?)
}
