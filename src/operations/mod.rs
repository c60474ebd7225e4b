// Operations module
// Business logic for synchronization runs

pub mod sync;
pub mod task;

pub use sync::{run, SyncSummary, Synchronizer};
pub use task::{start_async, SyncOutcome, SyncTask};
