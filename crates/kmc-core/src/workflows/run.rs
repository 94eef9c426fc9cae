use crate::core::io::LoadedSystem;
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::recorder::Recorder;
use crate::engine::simulation::{KmcEngine, RunSummary, Termination};
use tracing::{info, instrument, warn};

#[instrument(skip_all, name = "kmc_run", fields(run_id = config.run_id, seed = config.seed))]
pub fn run(
    system: &LoadedSystem,
    config: SimulationConfig,
    recorder: &mut dyn Recorder,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    let mut engine = KmcEngine::new(&system.topology, &system.neighbors, &system.rates, config)?;
    if engine.particles().is_empty() {
        warn!("Run starts without particles; it will end immediately.");
    }

    let summary = engine.run(recorder, reporter)?;
    if summary.termination == Termination::Exhausted {
        reporter.report(Progress::Message(format!(
            "Run {} exhausted all transitions after {} steps.",
            summary.run_id, summary.steps
        )));
    }
    info!(
        created = summary.particles_created,
        "Run complete in {} steps.", summary.steps
    );
    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::neighbors::tests::{build_table, chain_topology, pair};
    use crate::core::rates::RateEngine;
    use crate::core::rates::params::tests::sample_parameters;
    use crate::engine::config::{InitialCounts, InitialPopulation};
    use crate::engine::recorder::NullRecorder;
    use std::sync::Mutex;

    /// Four single-species sites in a ring, so excitons can only move and decay.
    pub(crate) fn system() -> LoadedSystem {
        let topology = chain_topology(&[0.0, 0.1, 0.0, 0.1], &[0, 0, 0, 0]);
        let params = sample_parameters();
        let neighbors = build_table(
            &topology,
            params,
            vec![pair(0, 1), pair(1, 2), pair(2, 3), pair(3, 0)],
            vec![pair(0, 2)],
        )
        .unwrap();
        let rates = RateEngine::for_topology(params, &topology).unwrap();
        LoadedSystem {
            topology,
            rates,
            neighbors,
        }
    }

    #[test]
    fn run_reports_progress_and_returns_summary() {
        let system = system();
        let config = SimulationConfig::builder()
            .seed(11)
            .initial_population(InitialPopulation::Counts(InitialCounts {
                singlets: 1,
                ..Default::default()
            }))
            .max_steps(1_000_000)
            .build()
            .unwrap();

        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));
        let summary = run(&system, config, &mut NullRecorder, &reporter).unwrap();
        drop(reporter);

        assert!(summary.steps >= 1);
        assert_eq!(summary.population.live(), 0);
        let events = seen.into_inner().unwrap();
        assert!(matches!(events.first(), Some(Progress::RunStart { run_id: 0, .. })));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Progress::RunFinish { termination: Termination::Exhausted, .. }))
        );
    }

    #[test]
    fn run_propagates_configuration_errors() {
        let system = system();
        let config = SimulationConfig::builder()
            .seed(11)
            .initial_population(InitialPopulation::Counts(InitialCounts {
                electrons: 5,
                ..Default::default()
            }))
            .max_steps(10)
            .build()
            .unwrap();
        let result = run(&system, config, &mut NullRecorder, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }
}
