use super::particles::ParticleArena;
use crate::core::models::particle::ParticleType;
use crate::core::models::topology::Topology;
use std::io;

/// Output collaborator called by the engine between steps.
///
/// Each call sees a consistent snapshot: the engine never mutates state while a call is in
/// progress. Formatting is entirely up to the implementation.
pub trait Recorder {
    /// Site of every particle spawned so far, in creation order.
    ///
    /// Dead particles keep their column, with the site they died on, even after compaction;
    /// see [`ParticleArena::sites_by_serial`].
    fn record_positions(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()>;

    /// Type and site of every live particle.
    fn record_state(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()>;

    fn record_population_counts(
        &mut self,
        particles: &ParticleArena,
        topology: &Topology,
        time: f64,
    ) -> io::Result<()>;
}

impl<R: Recorder + ?Sized> Recorder for Box<R> {
    fn record_positions(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()> {
        (**self).record_positions(particles, time)
    }

    fn record_state(&mut self, particles: &ParticleArena, time: f64) -> io::Result<()> {
        (**self).record_state(particles, time)
    }

    fn record_population_counts(
        &mut self,
        particles: &ParticleArena,
        topology: &Topology,
        time: f64,
    ) -> io::Result<()> {
        (**self).record_population_counts(particles, topology, time)
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record_positions(&mut self, _: &ParticleArena, _: f64) -> io::Result<()> {
        Ok(())
    }

    fn record_state(&mut self, _: &ParticleArena, _: f64) -> io::Result<()> {
        Ok(())
    }

    fn record_population_counts(
        &mut self,
        _: &ParticleArena,
        _: &Topology,
        _: f64,
    ) -> io::Result<()> {
        Ok(())
    }
}

/// Live particle counts per type, overall and per molecular species.
///
/// A CT state is attributed to the species of its hole site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationSnapshot {
    pub total: [usize; ParticleType::ALL.len()],
    pub by_species: Vec<[usize; ParticleType::ALL.len()]>,
}

impl PopulationSnapshot {
    pub fn collect(particles: &ParticleArena, topology: &Topology) -> Self {
        let mut total = [0; ParticleType::ALL.len()];
        let mut by_species = vec![[0; ParticleType::ALL.len()]; topology.species().len()];
        for (_, particle) in particles.iter_alive() {
            let channel = particle.kind().channel();
            total[channel] += 1;
            if let Some(species) = topology.species_of(particle.site()) {
                if let Some(row) = by_species.get_mut(species.index()) {
                    row[channel] += 1;
                }
            }
        }
        Self { total, by_species }
    }

    #[inline]
    pub fn count(&self, kind: ParticleType) -> usize {
        self.total[kind.channel()]
    }

    pub fn live(&self) -> usize {
        self.total.iter().sum()
    }
}
