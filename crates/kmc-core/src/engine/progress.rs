use super::simulation::Termination;

#[derive(Debug, Clone)]
pub enum Progress {
    RunStart { run_id: u64, max_steps: Option<u64> },
    /// Emitted every [`PROGRESS_INTERVAL`] executed steps.
    StepsCompleted { run_id: u64, steps: u64, time: f64 },
    RunFinish {
        run_id: u64,
        steps: u64,
        time: f64,
        termination: Termination,
    },

    Message(String),
}

pub const PROGRESS_INTERVAL: u64 = 1000;

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
