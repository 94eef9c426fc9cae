use crate::core::models::ids::{ParticleId, SiteId};
use crate::core::models::particle::{Particle, ParticleType};
use slotmap::SlotMap;
use std::collections::BTreeMap;
use tracing::trace;

/// Owns every particle of a run under stable [`ParticleId`]s.
///
/// Killing a particle only flips its alive flag. [`ParticleArena::compact`] removes dead
/// entries; live ids stay valid across compaction, so ids stored in sites never dangle.
/// Every particle also carries a creation serial, and compaction keeps the final site of
/// each removed particle under that serial so trajectory columns never shift.
#[derive(Debug, Clone, Default)]
pub struct ParticleArena {
    particles: SlotMap<ParticleId, Particle>,
    retired: BTreeMap<usize, SiteId>,
    dead: usize,
    spawned: usize,
}

impl ParticleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: ParticleType, site: SiteId, time: f64) -> ParticleId {
        let serial = self.spawned;
        self.spawned += 1;
        self.particles
            .insert(Particle::new(kind, site, time).with_serial(serial))
    }

    #[inline]
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Marks a live particle dead. Returns `false` if it was unknown or already dead.
    pub fn kill(&mut self, id: ParticleId, time: f64) -> bool {
        match self.particles.get_mut(id) {
            Some(p) if p.is_alive() => {
                p.kill(time);
                self.dead += 1;
                true
            }
            _ => false,
        }
    }

    /// All stored particles, dead ones included, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter()
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter().filter(|(_, p)| p.is_alive())
    }

    /// Stored particles, dead ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.particles.len() - self.dead
    }

    #[inline]
    pub fn dead_count(&self) -> usize {
        self.dead
    }

    /// Particles ever created in this arena, including removed ones.
    #[inline]
    pub fn spawned_count(&self) -> usize {
        self.spawned
    }

    pub fn count_alive(&self, kind: ParticleType) -> usize {
        self.iter_alive().filter(|(_, p)| p.kind() == kind).count()
    }

    /// Site of every particle ever spawned, indexed by creation serial.
    ///
    /// Dead particles report the site they died on, whether or not they were compacted.
    pub fn sites_by_serial(&self) -> Vec<SiteId> {
        let mut sites = vec![0; self.spawned];
        let stored = self.particles.values().map(|p| (p.serial(), p.site()));
        for (serial, site) in self.retired.iter().map(|(&s, &site)| (s, site)).chain(stored) {
            if let Some(slot) = sites.get_mut(serial) {
                *slot = site;
            }
        }
        sites
    }

    /// Drops dead particles and returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.particles.len();
        let retired = &mut self.retired;
        self.particles.retain(|_, p| {
            if !p.is_alive() {
                retired.insert(p.serial(), p.site());
            }
            p.is_alive()
        });
        let removed = before - self.particles.len();
        self.dead = 0;
        trace!(removed, remaining = self.particles.len(), "Compacted particle arena.");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_marks_dead_once() {
        let mut arena = ParticleArena::new();
        let id = arena.spawn(ParticleType::Singlet, 0, 0.0);
        assert!(arena.kill(id, 1.0));
        assert!(!arena.kill(id, 2.0));
        assert_eq!(arena.get(id).unwrap().died_at(), Some(1.0));
        assert_eq!(arena.live_count(), 0);
        assert_eq!(arena.dead_count(), 1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn compact_removes_dead_and_keeps_live_ids_valid() {
        let mut arena = ParticleArena::new();
        let a = arena.spawn(ParticleType::Electron, 0, 0.0);
        let b = arena.spawn(ParticleType::Hole, 1, 0.0);
        let c = arena.spawn(ParticleType::Triplet, 2, 0.0);
        arena.kill(b, 0.5);

        assert_eq!(arena.compact(), 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.dead_count(), 0);
        assert!(arena.get(b).is_none());
        assert_eq!(arena.get(a).unwrap().site(), 0);
        assert_eq!(arena.get(c).unwrap().kind(), ParticleType::Triplet);

        let d = arena.spawn(ParticleType::Singlet, 3, 1.0);
        assert_ne!(d, b);
        assert!(arena.get(b).is_none());
        assert_eq!(arena.spawned_count(), 4);
    }

    #[test]
    fn sites_by_serial_keeps_columns_stable_across_compaction() {
        let mut arena = ParticleArena::new();
        let a = arena.spawn(ParticleType::Electron, 0, 0.0);
        let b = arena.spawn(ParticleType::Hole, 1, 0.0);
        arena.spawn(ParticleType::Triplet, 2, 0.0);
        arena.kill(a, 0.5);
        assert_eq!(arena.sites_by_serial(), vec![0, 1, 2]);

        arena.compact();
        let d = arena.spawn(ParticleType::Singlet, 7, 1.0);

        assert_eq!(arena.get(d).unwrap().serial(), 3);
        assert_eq!(arena.get(b).unwrap().serial(), 1);
        assert_eq!(arena.sites_by_serial(), vec![0, 1, 2, 7]);
    }

    #[test]
    fn iter_alive_skips_dead_particles() {
        let mut arena = ParticleArena::new();
        let a = arena.spawn(ParticleType::Electron, 0, 0.0);
        let b = arena.spawn(ParticleType::Electron, 1, 0.0);
        arena.kill(a, 1.0);
        let alive: Vec<_> = arena.iter_alive().map(|(id, _)| id).collect();
        assert_eq!(alive, vec![b]);
        assert_eq!(arena.iter().count(), 2);
        assert_eq!(arena.count_alive(ParticleType::Electron), 1);
    }
}
