// Sync Job
// One synchronization configuration: roots, mode, exclusions, and event wiring

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::ConfigurationError;
use super::events::{EventBus, LogCategory, LogEvent, LogLevelMask, SubscriptionId};
use super::exclusion_store::ExclusionStore;
use crate::utilities::{absolute_path, is_inside, DateFormat, ExclusionSet};

/// What a run does with the destination tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Create missing files and overwrite changed ones
    #[default]
    Copy,

    /// Copy, then remove destination entries with no source counterpart
    CopyAndDelete,

    /// Copy, keeping the previous destination file under a timestamped name
    CopyWithVersioning,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Copy => "copy",
            SyncMode::CopyAndDelete => "copy_and_delete",
            SyncMode::CopyWithVersioning => "copy_with_versioning",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "copy" => Ok(SyncMode::Copy),
            "copy_and_delete" | "mirror" => Ok(SyncMode::CopyAndDelete),
            "copy_with_versioning" | "versioning" => Ok(SyncMode::CopyWithVersioning),
            other => Err(ConfigurationError::UnknownMode(other.to_string())),
        }
    }
}

/// Shared cooperative cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request that the current run stops at its next check
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A synchronization job
///
/// The roots are validated on construction: the source must be an existing
/// directory and the destination must not be the source or lie inside it.
/// A missing destination is created.
#[derive(Debug)]
pub struct SyncJob {
    name: String,
    source: PathBuf,
    destination: PathBuf,
    mode: SyncMode,
    date_format: DateFormat,
    log_level: LogLevelMask,
    exclusions: ExclusionSet,
    cancel: CancelHandle,
    events: EventBus,
}

impl SyncJob {
    /// Create a job, validating both roots
    pub fn new(
        name: impl Into<String>,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
        mode: SyncMode,
    ) -> Result<Self, ConfigurationError> {
        let (source, destination) = validate_roots(source.as_ref(), destination.as_ref())?;

        Ok(Self {
            name: name.into(),
            source,
            destination,
            mode,
            date_format: DateFormat::new(crate::core::app_config::compiled::DATE_FORMAT),
            log_level: LogLevelMask::default(),
            exclusions: ExclusionSet::new(),
            cancel: CancelHandle::default(),
            events: EventBus::new(),
        })
    }

    /// Set the log-level mask
    pub fn with_log_level(mut self, mask: LogLevelMask) -> Self {
        self.log_level = mask;
        self
    }

    /// Set the date format used for versioned file names
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = DateFormat::new(format);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Canonical destination root
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SyncMode) {
        self.mode = mode;
    }

    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    pub fn set_date_format(&mut self, format: &str) {
        self.date_format = DateFormat::new(format);
    }

    pub fn log_level(&self) -> LogLevelMask {
        self.log_level
    }

    pub fn set_log_level(&mut self, mask: LogLevelMask) {
        self.log_level = mask;
    }

    /// Replace both roots, with the same validation as [`SyncJob::new`]
    pub fn set_roots(
        &mut self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<(), ConfigurationError> {
        let (source, destination) = validate_roots(source.as_ref(), destination.as_ref())?;
        self.source = source;
        self.destination = destination;
        Ok(())
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut ExclusionSet {
        &mut self.exclusions
    }

    /// Add the patterns stored under this job's name
    ///
    /// Returns how many new patterns were registered.
    pub fn load_exclusions(&mut self, store: &dyn ExclusionStore) -> Result<usize> {
        let lines = store
            .load(&self.name)
            .with_context(|| format!("Failed to load exclusions for job '{}'", self.name))?;
        let added = self.exclusions.add_from_source(lines)?;
        Ok(added)
    }

    /// Persist the current patterns under this job's name
    pub fn save_exclusions(&self, store: &dyn ExclusionStore) -> Result<()> {
        store
            .save(&self.name, &self.exclusions.to_lines())
            .with_context(|| format!("Failed to save exclusions for job '{}'", self.name))
    }

    /// Request cancellation of the current or next run
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A handle that can cancel this job from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to one event category
    pub fn subscribe<F>(&mut self, category: LogCategory, handler: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(category, handler)
    }

    /// Subscribe to every event category
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        self.events.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Publish an event if its category is enabled in the mask
    pub(crate) fn emit(&self, category: LogCategory, message: impl Into<String>) {
        if self.log_level.is_enabled(category) {
            self.events.publish(&LogEvent::new(self.name.as_str(), category, message));
        }
    }
}

/// Check the roots and return their canonical forms, creating the destination
fn validate_roots(source: &Path, destination: &Path) -> Result<(PathBuf, PathBuf), ConfigurationError> {
    if !source.exists() {
        return Err(ConfigurationError::SourceMissing(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(ConfigurationError::SourceNotDirectory(source.to_path_buf()));
    }

    let source = source
        .canonicalize()
        .map_err(|_| ConfigurationError::SourceMissing(source.to_path_buf()))?;
    let unavailable = |source: std::io::Error| ConfigurationError::DestinationUnavailable {
        path: destination.to_path_buf(),
        source,
    };

    // Checked before creating anything, and again once symlinks are resolved
    let requested = absolute_path(destination).map_err(unavailable)?;
    ensure_not_nested(&source, &requested)?;

    fs::create_dir_all(&requested).map_err(unavailable)?;
    let destination = requested.canonicalize().map_err(unavailable)?;
    ensure_not_nested(&source, &destination)?;

    Ok((source, destination))
}

fn ensure_not_nested(source: &Path, destination: &Path) -> Result<(), ConfigurationError> {
    if is_inside(destination, source) {
        return Err(ConfigurationError::NestedDestination {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}
