// Background Sync
// Runs a job on the tokio blocking pool while the caller continues

use tokio::task::JoinHandle;

use super::sync::SyncSummary;
use crate::core::{CancelHandle, SyncError, SyncJob};

/// What a background run hands back: the job, ready for reuse, and its result
#[derive(Debug)]
pub struct SyncOutcome {
    pub job: SyncJob,
    pub result: Result<SyncSummary, SyncError>,
}

/// Handle to a job running in the background
#[derive(Debug)]
pub struct SyncTask {
    name: String,
    cancel: CancelHandle,
    handle: JoinHandle<SyncOutcome>,
}

impl SyncTask {
    /// Name of the running job
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the run to stop at its next cancellation check
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to end
    pub async fn wait(self) -> Result<SyncOutcome, SyncError> {
        self.handle
            .await
            .map_err(|e| SyncError::Task(e.to_string()))
    }
}

/// Start `job` on the blocking pool of the current tokio runtime
///
/// Must be called from within a runtime.
pub fn start_async(job: SyncJob) -> SyncTask {
    let name = job.name().to_string();
    let cancel = job.cancel_handle();
    let handle = tokio::task::spawn_blocking(move || {
        let result = job.run();
        SyncOutcome { job, result }
    });

    SyncTask { name, cancel, handle }
}

impl SyncJob {
    /// Run this job in the background; see [`start_async`]
    pub fn start_async(self) -> SyncTask {
        start_async(self)
    }
}
