// Mirror Sync Library
// Mirrors a source directory tree into a destination, with optional deletion,
// versioning of overwritten files, and regex exclusions

// Core infrastructure - jobs, events, errors, configuration
pub mod core;

// Operations - the synchronization walk and background runs
pub mod operations;

// Utilities - paths, patterns, date formats
pub mod utilities;

// Diagnostic logging setup
pub mod logging;

// Re-export commonly used items for convenience
pub use crate::core::{
    AppConfig, CancelHandle, ConfigurationError, ExclusionStore, FileExclusionStore, FileLogSink,
    JobsFile, LogCategory, LogEvent, LogLevelMask, MemoryExclusionStore, SyncError, SyncJob,
    SyncMode,
};
pub use crate::operations::{start_async, SyncOutcome, SyncSummary, SyncTask, Synchronizer};
pub use crate::utilities::{DateFormat, ExclusionSet};
