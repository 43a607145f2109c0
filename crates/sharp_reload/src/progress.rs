//! Reload progress reporting

use crate::state::{ReloadOutcome, ReloadStage};

/// Receives progress notifications while a reload runs
///
/// Callbacks run on the thread driving the reload.
pub trait ReloadProgress: Send + Sync {
    fn begin(&self, _total_stages: usize) {}
    fn enter_stage(&self, _stage: ReloadStage) {}
    fn finish(&self, _outcome: &ReloadOutcome) {}
}

/// Reports progress through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ReloadProgress for LogProgress {
    fn begin(&self, total_stages: usize) {
        log::info!("Hot reload started ({} stages)", total_stages);
    }

    fn enter_stage(&self, stage: ReloadStage) {
        log::info!("{}", stage.label());
    }

    fn finish(&self, outcome: &ReloadOutcome) {
        match outcome {
            ReloadOutcome::Completed => log::info!("Hot reload completed"),
            ReloadOutcome::Aborted(reason) => log::error!("Hot reload aborted: {}", reason),
        }
    }
}
