use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use optokmc::engine::progress::{Progress, ProgressCallback};
use optokmc::engine::simulation::Termination;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders engine progress as one bar per concurrently running trajectory.
#[derive(Clone)]
pub struct CliProgressHandler {
    mp: MultiProgress,
    bars: Arc<Mutex<HashMap<u64, ProgressBar>>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr_with_hz(12))
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            mp: MultiProgress::with_draw_target(target),
            bars: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |progress: Progress| handler.handle(progress))
    }

    fn handle(&self, progress: Progress) {
        let Ok(mut bars) = self.bars.lock() else {
            warn!("Progress bar mutex was poisoned. Cannot update progress.");
            return;
        };

        match progress {
            Progress::RunStart { run_id, max_steps } => {
                let pb = match max_steps {
                    Some(total) => ProgressBar::new(total).with_style(Self::bar_style()),
                    None => {
                        let pb = ProgressBar::new_spinner().with_style(Self::spinner_style());
                        pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                        pb
                    }
                };
                let pb = self.mp.add(pb);
                pb.set_message(format!("run {run_id}"));
                if let Some(old) = bars.insert(run_id, pb) {
                    old.finish_and_clear();
                }
            }
            Progress::StepsCompleted {
                run_id,
                steps,
                time,
            } => {
                if let Some(pb) = bars.get(&run_id) {
                    pb.set_position(steps);
                    pb.set_message(format!("run {run_id} t={time:.3e}s"));
                }
            }
            Progress::RunFinish {
                run_id,
                steps,
                time,
                termination,
            } => {
                if let Some(pb) = bars.remove(&run_id) {
                    pb.disable_steady_tick();
                    pb.set_position(steps);
                    pb.finish_with_message(format!(
                        "✓ run {run_id}: {} after {steps} steps, t={time:.3e}s",
                        Self::describe(termination)
                    ));
                }
            }
            Progress::Message(msg) => {
                self.mp.println(format!("  {}", msg)).ok();
            }
        }
    }

    fn describe(termination: Termination) -> &'static str {
        match termination {
            Termination::MaxTime => "time limit reached",
            Termination::MaxSteps => "step limit reached",
            Termination::Exhausted => "no transitions left",
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{pos} steps]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<30} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
