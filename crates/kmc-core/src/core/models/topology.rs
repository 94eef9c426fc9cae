use super::ids::{SiteId, SpeciesId};
use super::particle::ParticleType;
use super::site::SiteEnergies;
use crate::core::geometry::{GeometryError, PeriodicBox};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Species ids are `u16`.
pub const MAX_SPECIES: usize = u16::MAX as usize + 1;

#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("Topology contains no sites")]
    EmptyLattice,

    #[error("Thermal energy kT must be finite and positive, got {0}")]
    InvalidThermalEnergy(f64),

    #[error("Electric field must be finite, got {0}")]
    InvalidElectricField(f64),

    #[error("Site {site} refers to unknown molecular species {species}")]
    UnknownSpecies { site: SiteId, species: SpeciesId },

    #[error("Site {site} has a non-finite coordinate or energy")]
    NonFiniteSiteData { site: SiteId },

    #[error("Molecular species '{0}' is declared more than once")]
    DuplicateSpecies(String),

    #[error("{0} molecular species exceed the limit of {max}", max = MAX_SPECIES)]
    TooManySpecies(usize),

    #[error("Invalid simulation box: {0}")]
    Geometry(#[from] GeometryError),
}

/// Reorganization energies (eV) of one molecule for the three Marcus channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelReorganization {
    pub electron: f64,
    pub hole: f64,
    pub singlet: f64,
}

impl ChannelReorganization {
    fn for_type(&self, kind: ParticleType) -> Option<f64> {
        match kind {
            ParticleType::Electron => Some(self.electron),
            ParticleType::Hole => Some(self.hole),
            ParticleType::Singlet => Some(self.singlet),
            ParticleType::Triplet | ParticleType::ChargeTransfer => None,
        }
    }
}

/// Internal reorganization of a molecule losing (`to_neutral`) or gaining (`from_neutral`)
/// an excitation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpeciesReorganization {
    pub to_neutral: ChannelReorganization,
    pub from_neutral: ChannelReorganization,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MolecularSpecies {
    pub name: String,
    pub reorganization: Option<SpeciesReorganization>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteProperties {
    pub position: Point3<f64>,
    pub energies: SiteEnergies,
    pub species: SpeciesId,
}

/// The immutable description of the lattice: site coordinates, energies and species, plus
/// the global physical conditions (box, thermal energy, field along x).
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    sites: Vec<SiteProperties>,
    species: Vec<MolecularSpecies>,
    species_by_name: HashMap<String, SpeciesId>,
    periodic_box: PeriodicBox,
    thermal_energy: f64,
    electric_field: f64,
}

impl Topology {
    pub fn new(
        sites: Vec<SiteProperties>,
        species: Vec<MolecularSpecies>,
        periodic_box: PeriodicBox,
        thermal_energy: f64,
        electric_field: f64,
    ) -> Result<Self, TopologyError> {
        if sites.is_empty() {
            return Err(TopologyError::EmptyLattice);
        }
        if !thermal_energy.is_finite() || thermal_energy <= 0.0 {
            return Err(TopologyError::InvalidThermalEnergy(thermal_energy));
        }
        if !electric_field.is_finite() {
            return Err(TopologyError::InvalidElectricField(electric_field));
        }

        let mut species_by_name = HashMap::with_capacity(species.len());
        for (idx, sp) in species.iter().enumerate() {
            let id = SpeciesId::try_from(idx)
                .map_err(|_| TopologyError::TooManySpecies(species.len()))?;
            if species_by_name.insert(sp.name.clone(), id).is_some()
            {
                return Err(TopologyError::DuplicateSpecies(sp.name.clone()));
            }
        }

        for (id, site) in sites.iter().enumerate() {
            if site.species.index() >= species.len() {
                return Err(TopologyError::UnknownSpecies {
                    site: id,
                    species: site.species,
                });
            }
            let coords_finite = site.position.iter().all(|c| c.is_finite());
            if !coords_finite || !site.energies.is_finite() {
                return Err(TopologyError::NonFiniteSiteData { site: id });
            }
        }

        Ok(Self {
            sites,
            species,
            species_by_name,
            periodic_box,
            thermal_energy,
            electric_field,
        })
    }

    #[inline]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn site(&self, id: SiteId) -> Option<&SiteProperties> {
        self.sites.get(id)
    }

    #[inline]
    pub fn sites(&self) -> &[SiteProperties] {
        &self.sites
    }

    pub fn species_of(&self, id: SiteId) -> Option<SpeciesId> {
        self.sites.get(id).map(|s| s.species)
    }

    pub fn species(&self) -> &[MolecularSpecies] {
        &self.species
    }

    pub fn species_name(&self, id: SpeciesId) -> Option<&str> {
        self.species.get(id.index()).map(|s| s.name.as_str())
    }

    pub fn find_species(&self, name: &str) -> Option<SpeciesId> {
        self.species_by_name.get(name).copied()
    }

    #[inline]
    pub fn periodic_box(&self) -> &PeriodicBox {
        &self.periodic_box
    }

    /// kT in eV.
    #[inline]
    pub fn thermal_energy(&self) -> f64 {
        self.thermal_energy
    }

    /// Field component along x (V/nm).
    #[inline]
    pub fn electric_field(&self) -> f64 {
        self.electric_field
    }

    /// `E_to - E_from` for the given channel.
    pub fn delta_energy(&self, from: SiteId, to: SiteId, kind: ParticleType) -> Option<f64> {
        let e_from = self.sites.get(from)?.energies.for_type(kind)?;
        let e_to = self.sites.get(to)?.energies.for_type(kind)?;
        Some(e_to - e_from)
    }

    /// Reorganization energy of a transfer `from -> to`: the donor relaxes back to neutral
    /// while the acceptor relaxes into the excited/charged geometry.
    pub fn reorganization(&self, from: SiteId, to: SiteId, kind: ParticleType) -> Option<f64> {
        let donor = self.species.get(self.species_of(from)?.index())?;
        let acceptor = self.species.get(self.species_of(to)?.index())?;
        let out = donor.reorganization?.to_neutral.for_type(kind)?;
        let inn = acceptor.reorganization?.from_neutral.for_type(kind)?;
        Some(out + inn)
    }

    /// True when the two sites belong to different molecular species.
    pub fn is_heterojunction(&self, a: SiteId, b: SiteId) -> bool {
        match (self.species_of(a), self.species_of(b)) {
            (Some(x), Some(y)) => x != y,
            _ => false,
        }
    }
}
