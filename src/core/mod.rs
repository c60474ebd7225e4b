// Core infrastructure module
// Provides foundational systems that other modules depend on

pub mod app_config;
pub mod error;
pub mod events;
pub mod exclusion_store;
pub mod job;
pub mod job_config;
pub mod log_sink;

pub use app_config::AppConfig;
pub use error::{ConfigurationError, ExclusionError, SyncError};
pub use events::{EventBus, LogCategory, LogEvent, LogLevelMask, SubscriptionId};
pub use exclusion_store::{ExclusionStore, FileExclusionStore, MemoryExclusionStore};
pub use job::{CancelHandle, SyncJob, SyncMode};
pub use job_config::{GlobalSettings, JobDefinition, JobsFile};
pub use log_sink::FileLogSink;
