//! Progress reporting for deployment observers.

use tracing::info;

/// A status update emitted after each major phase transition.
#[derive(Debug, Clone)]
pub struct DeploymentProgress {
    pub step: String,
    /// 0-100 across the whole run.
    pub percent: u8,
    pub message: String,
}

/// Observer for deployment progress. Consumers need not react
/// synchronously; updates are fire-and-forget.
pub trait ProgressReporter {
    fn report(&self, progress: DeploymentProgress);
}

/// Discards all updates.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _progress: DeploymentProgress) {}
}

/// Forwards updates to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, progress: DeploymentProgress) {
        info!(
            step = %progress.step,
            percent = progress.percent,
            "{}",
            progress.message
        );
    }
}

/// Collects updates for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    updates: std::sync::Mutex<Vec<DeploymentProgress>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<DeploymentProgress> {
        self.updates.lock().expect("reporter lock poisoned").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, progress: DeploymentProgress) {
        self.updates
            .lock()
            .expect("reporter lock poisoned")
            .push(progress);
    }
}
