use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use optokmc::core::io::SystemPaths;
use optokmc::engine::config::{InitialCounts, InitialPopulation, RecordCadence, SimulationConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Values used when neither the run file nor the command line sets them.
pub struct DefaultsConfig {
    pub runs: u64,
    pub first_run: u64,
    pub output_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            runs: 1,
            first_run: 0,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSystemConfig {
    physics: Option<PathBuf>,
    sites: Option<PathBuf>,
    short_range_pairs: Option<PathBuf>,
    long_range_pairs: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSimulationConfig {
    seed: Option<u64>,
    runs: Option<u64>,
    first_run: Option<u64>,
    max_time: Option<f64>,
    max_steps: Option<u64>,
    compaction_threshold: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialInitialPopulation {
    Counts {
        #[serde(default)]
        electrons: usize,
        #[serde(default)]
        holes: usize,
        #[serde(default)]
        singlets: usize,
        #[serde(default)]
        triplets: usize,
    },
    AllSinglet,
}

impl From<PartialInitialPopulation> for InitialPopulation {
    fn from(p: PartialInitialPopulation) -> Self {
        match p {
            PartialInitialPopulation::Counts {
                electrons,
                holes,
                singlets,
                triplets,
            } => InitialPopulation::Counts(InitialCounts {
                electrons,
                holes,
                singlets,
                triplets,
            }),
            PartialInitialPopulation::AllSinglet => InitialPopulation::AllSinglet,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    record_every_steps: Option<u64>,
    record_every_time: Option<f64>,
}

/// The run file as written by the user. Every field is optional until merged.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    system: Option<PartialSystemConfig>,
    simulation: Option<PartialSimulationConfig>,
    initial_population: Option<PartialInitialPopulation>,
    output: Option<PartialOutputConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Everything the `run` command needs after merging file, overrides and flags.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub system: SystemPaths,
    pub simulation: SimulationConfig,
    pub run_ids: Vec<u64>,
    pub output_dir: PathBuf,
    pub record: bool,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading run configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Input paths, resolved against the directory of the run file.
    pub fn system_paths(&self) -> Result<SystemPaths> {
        let system = self
            .system
            .as_ref()
            .ok_or_else(|| CliError::Config("`[system]` section is required.".to_string()))?;
        let require = |value: &Option<PathBuf>, key: &str| -> Result<PathBuf> {
            value
                .as_ref()
                .map(|p| self.resolve(p))
                .ok_or_else(|| CliError::Config(format!("`system.{key}` is required.")))
        };
        Ok(SystemPaths {
            physics: require(&system.physics, "physics")?,
            sites: require(&system.sites, "sites")?,
            short_range_pairs: require(&system.short_range_pairs, "short-range-pairs")?,
            long_range_pairs: system.long_range_pairs.as_ref().map(|p| self.resolve(p)),
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn merge_with_cli(mut self, args: &RunArgs, defaults: &DefaultsConfig) -> Result<RunPlan> {
        self.apply_set_values(&args.set_values)?;
        let system = self.system_paths()?;

        let simulation = self.simulation.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();

        let seed = args
            .seed
            .or(simulation.seed)
            .ok_or_else(|| CliError::Config("`simulation.seed` is required.".to_string()))?;
        let population = self.initial_population.ok_or_else(|| {
            CliError::Config("`[initial-population]` section is required.".to_string())
        })?;

        let runs = args.runs.or(simulation.runs).unwrap_or(defaults.runs);
        if runs == 0 {
            return Err(CliError::Config("At least one run is required.".to_string()));
        }
        let first_run = simulation.first_run.unwrap_or(defaults.first_run);
        let run_ids = (first_run..first_run + runs).collect();

        let mut builder = SimulationConfig::builder()
            .seed(seed)
            .run_id(first_run)
            .initial_population(population.into());
        if let Some(max_time) = args.max_time.or(simulation.max_time) {
            builder = builder.max_time(max_time);
        }
        if let Some(max_steps) = args.max_steps.or(simulation.max_steps) {
            builder = builder.max_steps(max_steps);
        }
        if let Some(threshold) = simulation.compaction_threshold {
            builder = builder.compaction_threshold(threshold);
        }
        let cadence = Self::merge_cadence(args.no_record, &output)?;
        builder = builder.record_cadence(cadence);

        let output_dir = match (&args.output_dir, output.directory) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => self.resolve(&dir),
            (None, None) => defaults.output_dir.clone(),
        };

        Ok(RunPlan {
            system,
            simulation: builder.build().map_err(|e| CliError::Config(e.to_string()))?,
            run_ids,
            output_dir,
            record: cadence != RecordCadence::Never,
        })
    }

    fn merge_cadence(no_record: bool, output: &PartialOutputConfig) -> Result<RecordCadence> {
        if no_record {
            return Ok(RecordCadence::Never);
        }
        match (output.record_every_steps, output.record_every_time) {
            (Some(_), Some(_)) => Err(CliError::Config(
                "`output.record-every-steps` and `output.record-every-time` are mutually exclusive."
                    .to_string(),
            )),
            (Some(steps), None) => Ok(RecordCadence::EverySteps(steps)),
            (None, Some(dt)) => Ok(RecordCadence::EveryTime(dt)),
            (None, None) => Ok(RecordCadence::Never),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed = Some(parse(key, value)?)
                }
                "simulation.runs" => {
                    self.simulation.get_or_insert_with(Default::default).runs = Some(parse(key, value)?)
                }
                "simulation.first-run" => {
                    self.simulation.get_or_insert_with(Default::default).first_run =
                        Some(parse(key, value)?)
                }
                "simulation.max-time" => {
                    self.simulation.get_or_insert_with(Default::default).max_time =
                        Some(parse(key, value)?)
                }
                "simulation.max-steps" => {
                    self.simulation.get_or_insert_with(Default::default).max_steps =
                        Some(parse(key, value)?)
                }
                "simulation.compaction-threshold" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .compaction_threshold = Some(parse(key, value)?)
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value))
                }
                "output.record-every-steps" => {
                    self.output
                        .get_or_insert_with(Default::default)
                        .record_every_steps = Some(parse(key, value)?)
                }
                "output.record-every-time" => {
                    self.output
                        .get_or_insert_with(Default::default)
                        .record_every_time = Some(parse(key, value)?)
                }
                "initial-population.electrons"
                | "initial-population.holes"
                | "initial-population.singlets"
                | "initial-population.triplets" => {
                    let count: usize = parse(key, value)?;
                    self.set_initial_count(key, count);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Setting one count switches an `all-singlet` population to explicit counts.
    fn set_initial_count(&mut self, key: &str, count: usize) {
        let mut counts = match self.initial_population {
            Some(PartialInitialPopulation::Counts {
                electrons,
                holes,
                singlets,
                triplets,
            }) => InitialCounts {
                electrons,
                holes,
                singlets,
                triplets,
            },
            _ => InitialCounts::default(),
        };
        match key {
            "initial-population.electrons" => counts.electrons = count,
            "initial-population.holes" => counts.holes = count,
            "initial-population.singlets" => counts.singlets = count,
            _ => counts.triplets = count,
        }
        self.initial_population = Some(PartialInitialPopulation::Counts {
            electrons: counts.electrons,
            holes: counts.holes,
            singlets: counts.singlets,
            triplets: counts.triplets,
        });
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}
