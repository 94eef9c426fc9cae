use super::config::{InitialPopulation, RecordCadence, SimulationConfig};
use super::error::EngineError;
use super::event_list::{EventList, EventTarget, Transition};
use super::particles::ParticleArena;
use super::progress::{PROGRESS_INTERVAL, Progress, ProgressReporter};
use super::recorder::{PopulationSnapshot, Recorder};
use super::utils::sampling::RandomStream;
use crate::core::models::ids::{ParticleId, SiteId};
use crate::core::models::particle::{Particle, ParticleType};
use crate::core::models::site::Site;
use crate::core::models::topology::Topology;
use crate::core::neighbors::{NeighborTable, RateChannel};
use crate::core::rates::RateEngine;
use tracing::{debug, info, trace};

const CHANNELS: usize = ParticleType::ALL.len();

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    MaxTime,
    MaxSteps,
    /// No transition was enabled. A normal end, not a failure.
    Exhausted,
}

/// The event executed by one call to [`KmcEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutedEvent {
    pub step: u64,
    /// Clock after the waiting time of this step.
    pub time: f64,
    pub transition: Transition,
    pub particle: ParticleId,
    pub target: SiteId,
    pub rate: f64,
}

/// Occupation statistics of one site, per particle-type channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOccupation {
    pub site: SiteId,
    pub time: [f64; CHANNELS],
    pub fraction: [f64; CHANNELS],
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: u64,
    pub steps: u64,
    pub final_time: f64,
    pub termination: Termination,
    pub population: PopulationSnapshot,
    pub particles_created: usize,
    pub site_occupation: Vec<SiteOccupation>,
}

#[derive(Debug, Clone, Copy)]
struct DecayRates {
    singlet: f64,
    triplet: f64,
}

/// Decides after which steps the recorder is called.
struct RecordSchedule {
    cadence: RecordCadence,
    next_time: f64,
}

impl RecordSchedule {
    fn new(cadence: RecordCadence) -> Self {
        let next_time = match cadence {
            RecordCadence::EveryTime(dt) => dt,
            _ => 0.0,
        };
        Self { cadence, next_time }
    }

    fn due(&mut self, steps: u64, time: f64) -> bool {
        match self.cadence {
            RecordCadence::Never => false,
            RecordCadence::EverySteps(n) => steps % n == 0,
            RecordCadence::EveryTime(dt) => {
                if time >= self.next_time {
                    self.next_time = ((time / dt).floor() + 1.0) * dt;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// One kinetic Monte Carlo run.
///
/// The topology and neighbor table are borrowed and may be shared with other runs; sites,
/// particles, the event list and the random stream belong to this run alone.
pub struct KmcEngine<'a> {
    pub(super) topology: &'a Topology,
    pub(super) neighbors: &'a NeighborTable,
    pub(super) config: SimulationConfig,
    pub(super) sites: Vec<Site>,
    pub(super) particles: ParticleArena,
    pub(super) events: EventList,
    pub(super) rng: RandomStream,
    pub(super) time: f64,
    steps: u64,
    decay: DecayRates,
}

impl<'a> KmcEngine<'a> {
    pub fn new(
        topology: &'a Topology,
        neighbors: &'a NeighborTable,
        rates: &RateEngine,
        config: SimulationConfig,
    ) -> Result<Self, EngineError> {
        if neighbors.site_count() != topology.site_count() {
            return Err(EngineError::Configuration(format!(
                "neighbor table covers {} sites but the topology has {}",
                neighbors.site_count(),
                topology.site_count()
            )));
        }
        let decay = DecayRates {
            singlet: rates
                .decay(ParticleType::Singlet)
                .map_err(|e| EngineError::Configuration(e.to_string()))?,
            triplet: rates
                .decay(ParticleType::Triplet)
                .map_err(|e| EngineError::Configuration(e.to_string()))?,
        };

        let sites = topology
            .sites()
            .iter()
            .enumerate()
            .map(|(id, s)| Site::new(id, s.position, s.energies, s.species))
            .collect();

        let mut engine = Self {
            topology,
            neighbors,
            rng: RandomStream::for_run(config.seed, config.run_id),
            config,
            sites,
            particles: ParticleArena::new(),
            events: EventList::with_capacity(topology.site_count()),
            time: 0.0,
            steps: 0,
            decay,
        };
        engine.place_initial_population()?;
        Ok(engine)
    }

    fn place_initial_population(&mut self) -> Result<(), EngineError> {
        let site_count = self.sites.len();
        match self.config.initial_population {
            InitialPopulation::AllSinglet => {
                for site in 0..site_count {
                    self.place(ParticleType::Singlet, site)?;
                }
            }
            InitialPopulation::Counts(counts) => {
                let total = counts.total();
                if total > site_count {
                    return Err(EngineError::Configuration(format!(
                        "cannot place {total} particles on {site_count} sites"
                    )));
                }
                let kinds = std::iter::repeat_n(ParticleType::Electron, counts.electrons)
                    .chain(std::iter::repeat_n(ParticleType::Hole, counts.holes))
                    .chain(std::iter::repeat_n(ParticleType::Triplet, counts.triplets))
                    .chain(std::iter::repeat_n(ParticleType::Singlet, counts.singlets));
                if total == 0 {
                    return Ok(());
                }
                let picks = self.rng.distinct_indices(site_count, total);
                for (kind, site) in kinds.zip(picks) {
                    self.place(kind, site)?;
                }
            }
        }
        debug!(
            run_id = self.config.run_id,
            particles = self.particles.len(),
            "Placed initial population."
        );
        Ok(())
    }

    fn place(&mut self, kind: ParticleType, site: SiteId) -> Result<(), EngineError> {
        let id = self.particles.spawn(kind, site, self.time);
        self.sites[site]
            .occupy(kind, id, self.time)
            .map_err(|e| EngineError::invariant(None, Some(id), vec![site], e.to_string()))
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    #[inline]
    pub fn particles(&self) -> &ParticleArena {
        &self.particles
    }

    #[inline]
    pub fn event_list(&self) -> &EventList {
        &self.events
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Rebuilds the event list from the current state.
    pub fn enumerate(&mut self) -> Result<(), EngineError> {
        let Self {
            topology,
            neighbors,
            sites,
            particles,
            events,
            decay,
            ..
        } = self;
        events.reset();
        let scan = Enumerator {
            topology,
            neighbors,
            sites,
            decay: *decay,
        };
        for (id, particle) in particles.iter_alive() {
            scan.particle(events, id, particle)?;
        }
        Ok(())
    }

    /// Enumerates, advances the clock and executes one event. `None` when nothing can happen;
    /// the state is then left untouched.
    pub fn step(&mut self) -> Result<Option<ExecutedEvent>, EngineError> {
        self.enumerate()?;
        let total_rate = self.events.total_rate();
        if total_rate <= 0.0 {
            return Ok(None);
        }

        self.time += self.rng.waiting_time(total_rate);
        let u = self.rng.uniform();
        let event = *self.events.select(u).ok_or_else(|| {
            EngineError::invariant(
                None,
                None,
                Vec::new(),
                format!("no event selected although the total rate is {total_rate}"),
            )
        })?;

        self.execute(&event)?;
        self.steps += 1;

        if let Some(threshold) = self.config.compaction_threshold {
            if self.particles.dead_count() > threshold {
                self.particles.compact();
            }
        }

        trace!(
            step = self.steps,
            time = self.time,
            transition = event.transition.as_str(),
            target = event.target.site,
            rate = event.rate,
            "Executed event."
        );

        Ok(Some(ExecutedEvent {
            step: self.steps,
            time: self.time,
            transition: event.transition,
            particle: event.particle,
            target: event.target.site,
            rate: event.rate,
        }))
    }

    /// Steps until a stopping condition holds, calling `recorder` at the configured cadence.
    pub fn run(
        &mut self,
        recorder: &mut dyn Recorder,
        reporter: &ProgressReporter,
    ) -> Result<RunSummary, EngineError> {
        let run_id = self.config.run_id;
        info!(
            run_id,
            seed = self.config.seed,
            sites = self.sites.len(),
            particles = self.particles.live_count(),
            "Starting KMC run."
        );
        reporter.report(Progress::RunStart {
            run_id,
            max_steps: self.config.max_steps,
        });

        let mut schedule = RecordSchedule::new(self.config.record_cadence);
        let termination = loop {
            if self.config.max_time.is_some_and(|max| self.time >= max) {
                break Termination::MaxTime;
            }
            if self.config.max_steps.is_some_and(|max| self.steps >= max) {
                break Termination::MaxSteps;
            }
            if self.step()?.is_none() {
                break Termination::Exhausted;
            }
            if schedule.due(self.steps, self.time) {
                self.record(recorder)?;
            }
            if self.steps % PROGRESS_INTERVAL == 0 {
                reporter.report(Progress::StepsCompleted {
                    run_id,
                    steps: self.steps,
                    time: self.time,
                });
            }
        };

        let summary = self.summary(termination);
        info!(
            run_id,
            steps = summary.steps,
            time = summary.final_time,
            termination = ?termination,
            live = summary.population.live(),
            "KMC run finished."
        );
        reporter.report(Progress::RunFinish {
            run_id,
            steps: summary.steps,
            time: summary.final_time,
            termination,
        });
        Ok(summary)
    }

    /// Pushes one snapshot to every recorder channel.
    pub fn record(&self, recorder: &mut dyn Recorder) -> Result<(), EngineError> {
        recorder.record_positions(&self.particles, self.time)?;
        recorder.record_state(&self.particles, self.time)?;
        recorder.record_population_counts(&self.particles, self.topology, self.time)?;
        Ok(())
    }

    /// Occupation time and fraction of every site and channel up to the current clock.
    pub fn site_statistics(&self) -> Vec<SiteOccupation> {
        self.sites
            .iter()
            .map(|site| {
                let mut time = [0.0; CHANNELS];
                let mut fraction = [0.0; CHANNELS];
                for kind in ParticleType::ALL {
                    time[kind.channel()] = site.occupation_time(kind, self.time);
                    fraction[kind.channel()] = site.occupation_fraction(kind, self.time);
                }
                SiteOccupation {
                    site: site.id(),
                    time,
                    fraction,
                }
            })
            .collect()
    }

    pub fn summary(&self, termination: Termination) -> RunSummary {
        RunSummary {
            run_id: self.config.run_id,
            steps: self.steps,
            final_time: self.time,
            termination,
            population: PopulationSnapshot::collect(&self.particles, self.topology),
            particles_created: self.particles.spawned_count(),
            site_occupation: self.site_statistics(),
        }
    }
}

/// Read-only view used to turn the current occupancy into enabled events.
struct Enumerator<'s> {
    topology: &'s Topology,
    neighbors: &'s NeighborTable,
    sites: &'s [Site],
    decay: DecayRates,
}

impl Enumerator<'_> {
    fn particle(
        &self,
        events: &mut EventList,
        id: ParticleId,
        particle: &Particle,
    ) -> Result<(), EngineError> {
        match particle.kind() {
            ParticleType::Electron | ParticleType::Hole => self.carrier(events, id, particle),
            ParticleType::Singlet | ParticleType::Triplet => self.exciton(events, id, particle),
            ParticleType::ChargeTransfer => self.charge_transfer(events, id, particle),
        }
    }

    fn carrier(
        &self,
        events: &mut EventList,
        id: ParticleId,
        particle: &Particle,
    ) -> Result<(), EngineError> {
        let kind = particle.kind();
        let (hop, generation, opposite, formation) = match kind {
            ParticleType::Electron => (
                RateChannel::ElectronHop,
                RateChannel::ElectronGeneration,
                ParticleType::Hole,
                Transition::ExcitonFromElectron,
            ),
            _ => (
                RateChannel::HoleHop,
                RateChannel::HoleGeneration,
                ParticleType::Electron,
                Transition::ExcitonFromHole,
            ),
        };

        let origin = &self.sites[particle.site()];
        for record in origin.short_range(self.neighbors) {
            let target = &self.sites[record.target];
            let blocked = target.is_occupied(kind)
                || target.is_occupied(ParticleType::ChargeTransfer)
                || target.is_occupied(ParticleType::Singlet)
                || target.is_occupied(ParticleType::Triplet);
            if blocked {
                continue;
            }
            let target_spec = EventTarget::neighbor(record);
            if target.is_occupied(opposite) {
                events.push(record.rate(generation), formation, id, target_spec)?;
            } else {
                events.push(record.rate(hop), Transition::NormalHop, id, target_spec)?;
            }
        }
        Ok(())
    }

    fn exciton(
        &self,
        events: &mut EventList,
        id: ParticleId,
        particle: &Particle,
    ) -> Result<(), EngineError> {
        let here = particle.site();
        let origin = &self.sites[here];

        let (transfers, transfer_channel, decay_rate) = match particle.kind() {
            ParticleType::Singlet => (
                origin.long_range(self.neighbors),
                RateChannel::SingletTransfer,
                self.decay.singlet,
            ),
            _ => (
                origin.short_range(self.neighbors),
                RateChannel::TripletHop,
                self.decay.triplet,
            ),
        };
        for record in transfers {
            if !self.sites[record.target].is_blocked() {
                events.push(
                    record.rate(transfer_channel),
                    Transition::NormalHop,
                    id,
                    EventTarget::neighbor(record),
                )?;
            }
        }

        events.push(decay_rate, Transition::Decay, id, EventTarget::in_place(here))?;

        for record in origin.short_range(self.neighbors) {
            if self.sites[record.target].is_blocked()
                || !self.topology.is_heterojunction(here, record.target)
            {
                continue;
            }
            let target = EventTarget::neighbor(record);
            events.push(
                record.rate(RateChannel::CtFormationViaElectron),
                Transition::CtFormationViaElectron,
                id,
                target,
            )?;
            events.push(
                record.rate(RateChannel::CtFormationViaHole),
                Transition::CtFormationViaHole,
                id,
                target,
            )?;
        }
        Ok(())
    }

    fn charge_transfer(
        &self,
        events: &mut EventList,
        id: ParticleId,
        particle: &Particle,
    ) -> Result<(), EngineError> {
        let hole_site = particle.site();
        let electron_site = particle.partner_site().ok_or_else(|| {
            EngineError::invariant(
                None,
                Some(id),
                vec![hole_site],
                "CT state without an electron site",
            )
        })?;

        let missing_record = |from: SiteId, to: SiteId| {
            EngineError::invariant(
                None,
                Some(id),
                vec![from, to],
                format!("CT sites {from} and {to} are not short-range neighbours"),
            )
        };
        let to_hole = self
            .neighbors
            .short_range_record(electron_site, hole_site)
            .ok_or_else(|| missing_record(electron_site, hole_site))?;
        events.push(
            to_hole.rate(RateChannel::ElectronGeneration),
            Transition::ExcitonFromCtElectron,
            id,
            EventTarget::in_place(hole_site),
        )?;
        let to_electron = self
            .neighbors
            .short_range_record(hole_site, electron_site)
            .ok_or_else(|| missing_record(hole_site, electron_site))?;
        events.push(
            to_electron.rate(RateChannel::HoleGeneration),
            Transition::ExcitonFromCtHole,
            id,
            EventTarget::neighbor(to_electron),
        )?;

        let separations = [
            (
                hole_site,
                RateChannel::CtDissociationViaHole,
                Transition::CtDissociationViaHole,
            ),
            (
                electron_site,
                RateChannel::CtDissociationViaElectron,
                Transition::CtDissociationViaElectron,
            ),
        ];
        for (anchor, channel, transition) in separations {
            for record in self.sites[anchor].short_range(self.neighbors) {
                if !self.sites[record.target].is_blocked() {
                    events.push(
                        record.rate(channel),
                        transition,
                        id,
                        EventTarget::neighbor(record),
                    )?;
                }
            }
        }
        Ok(())
    }
}
