use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("At least one of max_time and max_steps must be set")]
    Unbounded,
}

/// Number of particles of each type placed before the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialCounts {
    pub electrons: usize,
    pub holes: usize,
    pub singlets: usize,
    pub triplets: usize,
}

impl InitialCounts {
    pub fn total(&self) -> usize {
        self.electrons + self.holes + self.singlets + self.triplets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPopulation {
    /// Random unique sites, placed in the order electrons, holes, triplets, singlets.
    Counts(InitialCounts),
    /// One singlet on every site.
    AllSinglet,
}

/// When the engine calls its recorder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RecordCadence {
    #[default]
    Never,
    /// After every `n`-th executed step.
    EverySteps(u64),
    /// After the first step that crosses each multiple of `dt`.
    EveryTime(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub run_id: u64,
    pub initial_population: InitialPopulation,
    pub max_time: Option<f64>,
    pub max_steps: Option<u64>,
    pub record_cadence: RecordCadence,
    /// Dead particles are dropped from the arena once more than this many accumulate.
    /// `None` keeps every particle for the whole run.
    pub compaction_threshold: Option<usize>,
}

impl SimulationConfig {
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    seed: Option<u64>,
    run_id: u64,
    initial_population: Option<InitialPopulation>,
    max_time: Option<f64>,
    max_steps: Option<u64>,
    record_cadence: RecordCadence,
    compaction_threshold: Option<usize>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn run_id(mut self, run_id: u64) -> Self {
        self.run_id = run_id;
        self
    }
    pub fn initial_population(mut self, population: InitialPopulation) -> Self {
        self.initial_population = Some(population);
        self
    }
    pub fn max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }
    pub fn max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
    pub fn record_cadence(mut self, cadence: RecordCadence) -> Self {
        self.record_cadence = cadence;
        self
    }
    pub fn compaction_threshold(mut self, threshold: usize) -> Self {
        self.compaction_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let seed = self.seed.ok_or(ConfigError::MissingParameter("seed"))?;
        let initial_population = self
            .initial_population
            .ok_or(ConfigError::MissingParameter("initial_population"))?;

        if self.max_time.is_none() && self.max_steps.is_none() {
            return Err(ConfigError::Unbounded);
        }
        if let Some(t) = self.max_time {
            if !t.is_finite() || t <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    name: "max_time",
                    reason: format!("must be finite and positive, got {t}"),
                });
            }
        }
        match self.record_cadence {
            RecordCadence::EverySteps(0) => {
                return Err(ConfigError::InvalidValue {
                    name: "record_cadence",
                    reason: "step interval must be at least 1".to_string(),
                });
            }
            RecordCadence::EveryTime(dt) if !dt.is_finite() || dt <= 0.0 => {
                return Err(ConfigError::InvalidValue {
                    name: "record_cadence",
                    reason: format!("time interval must be finite and positive, got {dt}"),
                });
            }
            _ => {}
        }

        Ok(SimulationConfig {
            seed,
            run_id: self.run_id,
            initial_population,
            max_time: self.max_time,
            max_steps: self.max_steps,
            record_cadence: self.record_cadence,
            compaction_threshold: self.compaction_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> InitialPopulation {
        InitialPopulation::Counts(InitialCounts {
            electrons: 1,
            ..Default::default()
        })
    }

    #[test]
    fn build_requires_seed_and_population() {
        assert_eq!(
            SimulationConfig::builder().max_steps(10).build(),
            Err(ConfigError::MissingParameter("seed"))
        );
        assert_eq!(
            SimulationConfig::builder().seed(1).max_steps(10).build(),
            Err(ConfigError::MissingParameter("initial_population"))
        );
    }

    #[test]
    fn build_requires_a_stopping_condition() {
        let result = SimulationConfig::builder()
            .seed(1)
            .initial_population(counts())
            .build();
        assert_eq!(result, Err(ConfigError::Unbounded));
    }

    #[test]
    fn build_rejects_zero_cadence_and_negative_time() {
        let base = || {
            SimulationConfig::builder()
                .seed(1)
                .initial_population(counts())
                .max_steps(5)
        };
        assert!(matches!(
            base().record_cadence(RecordCadence::EverySteps(0)).build(),
            Err(ConfigError::InvalidValue { name: "record_cadence", .. })
        ));
        assert!(matches!(
            base().record_cadence(RecordCadence::EveryTime(-1.0)).build(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            base().max_time(-1.0).build(),
            Err(ConfigError::InvalidValue { name: "max_time", .. })
        ));
    }

    #[test]
    fn build_fills_defaults() {
        let config = SimulationConfig::builder()
            .seed(42)
            .initial_population(InitialPopulation::AllSinglet)
            .max_time(1e-6)
            .build()
            .unwrap();
        assert_eq!(config.run_id, 0);
        assert_eq!(config.max_steps, None);
        assert_eq!(config.record_cadence, RecordCadence::Never);
        assert_eq!(config.compaction_threshold, None);
    }

    #[test]
    fn initial_counts_total_sums_all_types() {
        let counts = InitialCounts {
            electrons: 1,
            holes: 2,
            singlets: 3,
            triplets: 4,
        };
        assert_eq!(counts.total(), 10);
    }
}
