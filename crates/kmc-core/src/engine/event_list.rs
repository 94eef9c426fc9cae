use super::error::EngineError;
use crate::core::models::ids::{ParticleId, SiteId};
use crate::core::neighbors::NeighborRecord;
use nalgebra::Vector3;

/// Every kind of state change the engine can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A single-site particle moves to an empty neighbour.
    NormalHop,
    Decay,
    /// A free electron lands on a hole and the pair becomes an exciton.
    ExcitonFromElectron,
    ExcitonFromHole,
    /// The electron of a CT state joins its hole.
    ExcitonFromCtElectron,
    /// The hole of a CT state joins its electron.
    ExcitonFromCtHole,
    CtFormationViaElectron,
    CtFormationViaHole,
    CtDissociationViaElectron,
    CtDissociationViaHole,
}

impl Transition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Transition::NormalHop => "hop",
            Transition::Decay => "decay",
            Transition::ExcitonFromElectron => "exciton_from_electron",
            Transition::ExcitonFromHole => "exciton_from_hole",
            Transition::ExcitonFromCtElectron => "exciton_from_ct_electron",
            Transition::ExcitonFromCtHole => "exciton_from_ct_hole",
            Transition::CtFormationViaElectron => "ct_formation_electron",
            Transition::CtFormationViaHole => "ct_formation_hole",
            Transition::CtDissociationViaElectron => "ct_dissociation_electron",
            Transition::CtDissociationViaHole => "ct_dissociation_hole",
        }
    }
}

/// Where an event sends its particle: a site and the displacement to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTarget {
    pub site: SiteId,
    pub dr: Vector3<f64>,
}

impl EventTarget {
    /// The particle stays where it is.
    pub fn in_place(site: SiteId) -> Self {
        Self {
            site,
            dr: Vector3::zeros(),
        }
    }

    pub fn neighbor(record: &NeighborRecord) -> Self {
        Self {
            site: record.target,
            dr: record.dr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEvent {
    pub rate: f64,
    pub transition: Transition,
    pub particle: ParticleId,
    pub target: EventTarget,
}

/// The enabled transitions of one step, sampled by inverse CDF over insertion order.
#[derive(Debug, Default, Clone)]
pub struct EventList {
    events: Vec<PendingEvent>,
    total_rate: f64,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            total_rate: 0.0,
        }
    }

    /// Empties the list, keeping its allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.events.clear();
        self.total_rate = 0.0;
    }

    pub fn push(
        &mut self,
        rate: f64,
        transition: Transition,
        particle: ParticleId,
        target: EventTarget,
    ) -> Result<(), EngineError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(EngineError::InvalidRate { rate, transition });
        }
        self.events.push(PendingEvent {
            rate,
            transition,
            particle,
            target,
        });
        self.total_rate += rate;
        Ok(())
    }

    #[inline]
    pub fn total_rate(&self) -> f64 {
        self.total_rate
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[PendingEvent] {
        &self.events
    }

    /// Picks the first event whose cumulative rate reaches `uniform01 * total_rate`.
    ///
    /// Zero-rate events are never returned. If rounding leaves the scan short of the
    /// threshold, the last nonzero-rate event is returned. `None` only when no event has a
    /// nonzero rate.
    pub fn select(&self, uniform01: f64) -> Option<&PendingEvent> {
        let threshold = uniform01 * self.total_rate;
        let mut cumulative = 0.0;
        let mut last_nonzero = None;
        for event in &self.events {
            if event.rate == 0.0 {
                continue;
            }
            cumulative += event.rate;
            if cumulative >= threshold {
                return Some(event);
            }
            last_nonzero = Some(event);
        }
        last_nonzero
    }
}
