// Error Types
// Fatal configuration errors and root-level sync failures

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid job configuration, raised when a job is built or its paths change
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("source is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("destination {destination} is inside source {source_dir}")]
    NestedDestination {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error("failed to prepare destination {path}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown sync mode: {0}")]
    UnknownMode(String),

    #[error("unknown log category: {0}")]
    UnknownCategory(String),
}

/// Errors raised while editing an exclusion set
#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("invalid exclusion pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that abort a whole synchronization run
///
/// Failures on individual entries never surface here; they are reported
/// through `Error` log events instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("background sync task failed: {0}")]
    Task(String),
}
