use crate::cli::RunArgs;
use crate::config::{DefaultsConfig, PartialRunConfig};
use crate::error::{CliError, Result};
use crate::output::{FileRecorder, write_site_occupation};
use crate::utils::progress::CliProgressHandler;
use optokmc::core::io::load_system;
use optokmc::engine::progress::ProgressReporter;
use optokmc::engine::recorder::{NullRecorder, Recorder};
use optokmc::workflows::batch::run_batch;
use std::io;
use tracing::{error, info};

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let plan = partial_config.merge_with_cli(&args, &DefaultsConfig::default())?;

    info!("Loading system from {:?}", plan.system.sites);
    let system = load_system(&plan.system)?;
    std::fs::create_dir_all(&plan.output_dir)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting {} run(s) on {} sites...",
        plan.run_ids.len(),
        system.topology.site_count()
    );
    let output_dir = plan.output_dir.as_path();
    let topology = &system.topology;
    let record = plan.record;
    let outcomes = run_batch(
        &system,
        &plan.simulation,
        &plan.run_ids,
        |run_id| -> io::Result<Box<dyn Recorder>> {
            if record {
                Ok(Box::new(FileRecorder::create(output_dir, run_id, topology)?))
            } else {
                Ok(Box::new(NullRecorder))
            }
        },
        &reporter,
    );

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => {
                let path = write_site_occupation(output_dir, summary).map_err(|e| {
                    CliError::FileParsing {
                        path: output_dir.to_path_buf(),
                        source: e.into(),
                    }
                })?;
                println!(
                    "✓ Run {}: {} steps, t = {:.5e} s, {:?}; occupation written to {}",
                    summary.run_id,
                    summary.steps,
                    summary.final_time,
                    summary.termination,
                    path.display()
                );
            }
            Err(e) => {
                failed += 1;
                error!(run_id = outcome.run_id, "Run failed: {}", e);
                eprintln!("✗ Run {} failed: {}", outcome.run_id, e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::RunsFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}
