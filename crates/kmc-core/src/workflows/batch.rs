use super::run::run;
use crate::core::io::LoadedSystem;
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::recorder::Recorder;
use crate::engine::simulation::RunSummary;
use std::io;
use tracing::{error, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of one run in a batch. Failures stay local to their run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub run_id: u64,
    pub result: Result<RunSummary, EngineError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs every id in `run_ids` from a copy of `base` that differs only in its run id.
///
/// `make_recorder` is called once per run, on the thread executing that run. Outcomes are
/// returned in the order of `run_ids`.
#[instrument(skip_all, name = "kmc_batch", fields(runs = run_ids.len()))]
pub fn run_batch<F, R>(
    system: &LoadedSystem,
    base: &SimulationConfig,
    run_ids: &[u64],
    make_recorder: F,
    reporter: &ProgressReporter,
) -> Vec<BatchOutcome>
where
    F: Fn(u64) -> io::Result<R> + Sync,
    R: Recorder,
{
    reporter.report(Progress::Message(format!(
        "Starting {} independent runs.",
        run_ids.len()
    )));

    #[cfg(not(feature = "parallel"))]
    let iterator = run_ids.iter();

    #[cfg(feature = "parallel")]
    let iterator = run_ids.par_iter();

    let outcomes: Vec<BatchOutcome> = iterator
        .map(|&run_id| {
            let mut config = base.clone();
            config.run_id = run_id;
            let result = make_recorder(run_id)
                .map_err(EngineError::from)
                .and_then(|mut recorder| run(system, config, &mut recorder, reporter));
            if let Err(e) = &result {
                error!(run_id, error = %e, "Run failed.");
            }
            BatchOutcome { run_id, result }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        completed = outcomes.len() - failed,
        failed, "Batch finished."
    );
    outcomes
}
