use super::ids::{ParticleId, SiteId, SpeciesId};
use super::particle::ParticleType;
use crate::core::neighbors::{NeighborRecord, NeighborTable};
use nalgebra::Point3;
use thiserror::Error;

const CHANNEL_COUNT: usize = ParticleType::ALL.len();

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OccupancyError {
    #[error("Site {site} has no {channel} occupant")]
    NotOccupied { site: SiteId, channel: ParticleType },

    #[error("Site {site} already holds {channel} particle {occupant:?}")]
    AlreadyOccupied {
        site: SiteId,
        channel: ParticleType,
        occupant: ParticleId,
    },

    #[error("Occupancy update at site {site} went back in time ({now} < {since})")]
    TimeReversal { site: SiteId, since: f64, now: f64 },
}

/// Static energy levels of a site, one per single-site particle channel (eV).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SiteEnergies {
    pub electron: f64,
    pub hole: f64,
    pub singlet: f64,
    pub triplet: f64,
}

impl SiteEnergies {
    /// `None` for [`ParticleType::ChargeTransfer`], which spans two sites.
    #[inline]
    pub fn for_type(&self, kind: ParticleType) -> Option<f64> {
        match kind {
            ParticleType::Electron => Some(self.electron),
            ParticleType::Hole => Some(self.hole),
            ParticleType::Singlet => Some(self.singlet),
            ParticleType::Triplet => Some(self.triplet),
            ParticleType::ChargeTransfer => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.electron, self.hole, self.singlet, self.triplet]
            .iter()
            .all(|e| e.is_finite())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChannelOccupancy {
    occupant: Option<ParticleId>,
    since: f64,
    accumulated: f64,
}

/// Mutable per-run state of one lattice site.
///
/// Each particle type has its own occupancy channel. A channel records at most one occupant
/// and the total time it has been occupied. Which channel combinations may coexist is decided
/// by the engine, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    id: SiteId,
    position: Point3<f64>,
    energies: SiteEnergies,
    species: SpeciesId,
    channels: [ChannelOccupancy; CHANNEL_COUNT],
}

impl Site {
    pub fn new(id: SiteId, position: Point3<f64>, energies: SiteEnergies, species: SpeciesId) -> Self {
        Self {
            id,
            position,
            energies,
            species,
            channels: [ChannelOccupancy::default(); CHANNEL_COUNT],
        }
    }

    #[inline]
    pub fn id(&self) -> SiteId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    #[inline]
    pub fn energies(&self) -> &SiteEnergies {
        &self.energies
    }

    #[inline]
    pub fn energy(&self, kind: ParticleType) -> Option<f64> {
        self.energies.for_type(kind)
    }

    #[inline]
    pub fn species(&self) -> SpeciesId {
        self.species
    }

    #[inline]
    pub fn short_range<'t>(&self, table: &'t NeighborTable) -> &'t [NeighborRecord] {
        table.short_range_neighbors_of(self.id)
    }

    #[inline]
    pub fn long_range<'t>(&self, table: &'t NeighborTable) -> &'t [NeighborRecord] {
        table.long_range_neighbors_of(self.id)
    }

    #[inline]
    pub fn is_occupied(&self, channel: ParticleType) -> bool {
        self.channels[channel.channel()].occupant.is_some()
    }

    /// True when any channel holds a particle.
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.channels.iter().any(|c| c.occupant.is_some())
    }

    pub fn occupant(&self, channel: ParticleType) -> Result<ParticleId, OccupancyError> {
        self.channels[channel.channel()]
            .occupant
            .ok_or(OccupancyError::NotOccupied {
                site: self.id,
                channel,
            })
    }

    pub fn occupy(
        &mut self,
        channel: ParticleType,
        particle: ParticleId,
        now: f64,
    ) -> Result<(), OccupancyError> {
        let site = self.id;
        let slot = &mut self.channels[channel.channel()];
        if let Some(occupant) = slot.occupant {
            return Err(OccupancyError::AlreadyOccupied {
                site,
                channel,
                occupant,
            });
        }
        slot.occupant = Some(particle);
        slot.since = now;
        Ok(())
    }

    /// Empties a channel, banks its occupation interval and returns the former occupant.
    pub fn free(&mut self, channel: ParticleType, now: f64) -> Result<ParticleId, OccupancyError> {
        let site = self.id;
        let slot = &mut self.channels[channel.channel()];
        let occupant = slot
            .occupant
            .ok_or(OccupancyError::NotOccupied { site, channel })?;
        if now < slot.since {
            return Err(OccupancyError::TimeReversal {
                site,
                since: slot.since,
                now,
            });
        }
        slot.accumulated += now - slot.since;
        slot.occupant = None;
        Ok(occupant)
    }

    /// Moves the occupancy of `particle` from channel `from` to channel `to`.
    pub fn retype(
        &mut self,
        from: ParticleType,
        to: ParticleType,
        particle: ParticleId,
        now: f64,
    ) -> Result<(), OccupancyError> {
        self.free(from, now)?;
        self.occupy(to, particle, now)
    }

    /// Occupation time banked by completed intervals only.
    #[inline]
    pub fn accumulated_time(&self, channel: ParticleType) -> f64 {
        self.channels[channel.channel()].accumulated
    }

    /// Occupation time up to `now`, including a still-open interval.
    pub fn occupation_time(&self, channel: ParticleType, now: f64) -> f64 {
        let slot = &self.channels[channel.channel()];
        match slot.occupant {
            Some(_) => slot.accumulated + (now - slot.since).max(0.0),
            None => slot.accumulated,
        }
    }

    pub fn occupation_fraction(&self, channel: ParticleType, now: f64) -> f64 {
        if now <= 0.0 {
            return 0.0;
        }
        self.occupation_time(channel, now) / now
    }
}
