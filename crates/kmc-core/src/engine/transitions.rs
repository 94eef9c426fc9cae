use super::error::EngineError;
use super::event_list::{PendingEvent, Transition};
use super::simulation::KmcEngine;
use crate::core::models::ids::{ParticleId, SiteId};
use crate::core::models::particle::{Particle, ParticleType};
use crate::core::models::site::Site;

fn violation(event: &PendingEvent, sites: Vec<SiteId>, message: impl Into<String>) -> EngineError {
    EngineError::invariant(
        Some(event.transition),
        Some(event.particle),
        sites,
        message,
    )
}

impl KmcEngine<'_> {
    /// Applies one selected event to sites and particles.
    ///
    /// `origin` is the particle's current site (the hole site for a CT state) and `target` is
    /// the event's destination. Every occupancy change is stamped with the current clock.
    pub(super) fn execute(&mut self, event: &PendingEvent) -> Result<(), EngineError> {
        let id = event.particle;
        let (kind, origin, partner) = {
            let particle = self.particle_mut(event)?;
            if !particle.is_alive() {
                return Err(violation(event, vec![particle.site()], "selected a dead particle"));
            }
            (particle.kind(), particle.site(), particle.partner_site())
        };
        let target = event.target.site;
        let dr = event.target.dr;
        let now = self.time;
        const CT: ParticleType = ParticleType::ChargeTransfer;

        match event.transition {
            Transition::NormalHop => {
                self.release(event, origin, kind, id)?;
                self.occupy(event, target, kind, id)?;
                self.particle_mut(event)?.jump_to(target, dr);
            }
            Transition::Decay => {
                self.release(event, origin, kind, id)?;
                self.particles.kill(id, now);
            }
            Transition::ExcitonFromElectron | Transition::ExcitonFromHole => {
                let partner_kind = kind.complement().ok_or_else(|| {
                    violation(event, vec![origin], format!("{kind} is not a free carrier"))
                })?;
                self.release(event, origin, kind, id)?;
                let partner_id = self
                    .site(event, target)?
                    .occupant(partner_kind)
                    .map_err(|e| violation(event, vec![origin, target], e.to_string()))?;
                let u = self.rng.uniform();
                let exciton = self
                    .particles
                    .get_mut(partner_id)
                    .ok_or_else(|| violation(event, vec![target], "partner carrier is missing"))?
                    .make_exciton(u);
                self.retype(event, target, partner_kind, exciton, partner_id)?;
                self.particles.kill(id, now);
            }
            Transition::ExcitonFromCtElectron => {
                let electron_site = Self::ct_partner(event, origin, partner)?;
                self.release(event, electron_site, CT, id)?;
                let u = self.rng.uniform();
                let exciton = self.particle_mut(event)?.make_exciton(u);
                self.retype(event, origin, CT, exciton, id)?;
            }
            Transition::ExcitonFromCtHole => {
                let electron_site = Self::ct_partner(event, origin, partner)?;
                self.release(event, origin, CT, id)?;
                let u = self.rng.uniform();
                let particle = self.particle_mut(event)?;
                let exciton = particle.make_exciton(u);
                particle.jump_to(electron_site, dr);
                self.retype(event, electron_site, CT, exciton, id)?;
            }
            Transition::CtFormationViaElectron => {
                self.occupy(event, target, CT, id)?;
                self.retype(event, origin, kind, CT, id)?;
                self.particle_mut(event)?.make_ct_state(origin, target);
            }
            Transition::CtFormationViaHole => {
                self.occupy(event, target, CT, id)?;
                self.retype(event, origin, kind, CT, id)?;
                let particle = self.particle_mut(event)?;
                particle.make_ct_state(target, origin);
                particle.jump_to(target, dr);
            }
            Transition::CtDissociationViaElectron => {
                let electron_site = Self::ct_partner(event, origin, partner)?;
                // The particle is tracked at its hole; it now follows the electron.
                let to_electron = self
                    .neighbors
                    .short_range_record(origin, electron_site)
                    .map(|r| r.dr)
                    .ok_or_else(|| {
                        violation(event, vec![origin, electron_site], "CT sites are not adjacent")
                    })?;
                self.release(event, origin, CT, id)?;
                self.release(event, electron_site, CT, id)?;
                let particle = self.particle_mut(event)?;
                particle.make_electron(target);
                particle.jump_to(target, to_electron + dr);
                let hole = self.particles.spawn(ParticleType::Hole, origin, now);
                self.occupy(event, target, ParticleType::Electron, id)?;
                self.occupy(event, origin, ParticleType::Hole, hole)?;
            }
            Transition::CtDissociationViaHole => {
                let electron_site = Self::ct_partner(event, origin, partner)?;
                self.release(event, origin, CT, id)?;
                self.release(event, electron_site, CT, id)?;
                let particle = self.particle_mut(event)?;
                particle.make_hole(target);
                particle.jump_to(target, dr);
                let electron = self.particles.spawn(ParticleType::Electron, electron_site, now);
                self.occupy(event, target, ParticleType::Hole, id)?;
                self.occupy(event, electron_site, ParticleType::Electron, electron)?;
            }
        }
        Ok(())
    }

    fn ct_partner(
        event: &PendingEvent,
        origin: SiteId,
        partner: Option<SiteId>,
    ) -> Result<SiteId, EngineError> {
        partner.ok_or_else(|| violation(event, vec![origin], "CT state without an electron site"))
    }

    fn particle_mut(&mut self, event: &PendingEvent) -> Result<&mut Particle, EngineError> {
        self.particles
            .get_mut(event.particle)
            .ok_or_else(|| violation(event, Vec::new(), "particle is not in the arena"))
    }

    fn site(
        &self,
        event: &PendingEvent,
        site: SiteId,
    ) -> Result<&Site, EngineError> {
        self.sites
            .get(site)
            .ok_or_else(|| violation(event, vec![site], "site index out of range"))
    }

    fn site_mut(
        &mut self,
        event: &PendingEvent,
        site: SiteId,
    ) -> Result<&mut Site, EngineError> {
        self.sites
            .get_mut(site)
            .ok_or_else(|| violation(event, vec![site], "site index out of range"))
    }

    /// Frees `channel` at `site`, which must be held by `expected`.
    fn release(
        &mut self,
        event: &PendingEvent,
        site: SiteId,
        channel: ParticleType,
        expected: ParticleId,
    ) -> Result<(), EngineError> {
        let now = self.time;
        let freed = self
            .site_mut(event, site)?
            .free(channel, now)
            .map_err(|e| violation(event, vec![site], e.to_string()))?;
        if freed != expected {
            return Err(violation(
                event,
                vec![site],
                format!("{channel} channel was held by {freed:?}, expected {expected:?}"),
            ));
        }
        Ok(())
    }

    fn occupy(
        &mut self,
        event: &PendingEvent,
        site: SiteId,
        channel: ParticleType,
        particle: ParticleId,
    ) -> Result<(), EngineError> {
        let now = self.time;
        self.site_mut(event, site)?
            .occupy(channel, particle, now)
            .map_err(|e| violation(event, vec![site], e.to_string()))
    }

    fn retype(
        &mut self,
        event: &PendingEvent,
        site: SiteId,
        from: ParticleType,
        to: ParticleType,
        particle: ParticleId,
    ) -> Result<(), EngineError> {
        let now = self.time;
        self.site_mut(event, site)?
            .retype(from, to, particle, now)
            .map_err(|e| violation(event, vec![site], e.to_string()))
    }
}
