// Job Configuration
// YAML job definitions: what to mirror, where, and how

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::app_config::AppConfig;
use super::events::LogLevelMask;
use super::job::{SyncJob, SyncMode};
use crate::utilities::resolve_path;

/// A jobs file
///
/// Relative paths inside it are resolved against the directory holding the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsFile {
    /// Settings shared by every job
    #[serde(default)]
    pub settings: GlobalSettings,

    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Directory of `<job>.exclude` files, shared by jobs with the same name
    pub exclusion_store: Option<PathBuf>,

    /// Log file receiving `[<time>] <message>` lines from every job
    pub log_file: Option<PathBuf>,

    /// Extra patterns applied to every job
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One job as written in the jobs file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,

    pub source: PathBuf,

    pub destination: PathBuf,

    /// Falls back to the compiled default when absent
    pub mode: Option<SyncMode>,

    pub date_format: Option<String>,

    /// Category names, e.g. `[error, finished, file_deleted]`
    pub log_level: Option<Vec<String>>,

    /// Patterns specific to this job
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether this job runs
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool { true }

impl JobsFile {
    /// Load a jobs file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read jobs file: {}", path.display()))?;

        let mut jobs: JobsFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse jobs file YAML: {}", path.display()))?;

        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        jobs.resolve_paths(&base);

        Ok(jobs)
    }

    /// Save the jobs file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize jobs file")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write jobs file: {}", path.display()))?;

        Ok(())
    }

    /// Get a job definition by name
    pub fn get_job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Get all enabled job definitions
    pub fn enabled_jobs(&self) -> impl Iterator<Item = &JobDefinition> {
        self.jobs.iter().filter(|j| j.enabled)
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.settings.exclusion_store = self
            .settings
            .exclusion_store
            .as_deref()
            .map(|p| resolve_path(base, p));
        self.settings.log_file = self
            .settings
            .log_file
            .as_deref()
            .map(|p| resolve_path(base, p));
        for job in &mut self.jobs {
            job.source = resolve_path(base, &job.source);
            job.destination = resolve_path(base, &job.destination);
        }
    }
}

impl JobDefinition {
    /// Build a validated job
    ///
    /// Patterns are added in order: compiled global excludes, the jobs file's
    /// shared patterns, then the job's own.
    pub fn build(&self, defaults: &AppConfig, shared_excludes: &[String]) -> Result<SyncJob> {
        let mode = self.mode.unwrap_or(defaults.defaults.mode);
        let log_level = match &self.log_level {
            Some(names) => LogLevelMask::from_names(names)
                .with_context(|| format!("Invalid log_level for job '{}'", self.name))?,
            None => defaults.defaults.log_level,
        };
        let date_format = self
            .date_format
            .as_deref()
            .unwrap_or(&defaults.defaults.date_format);

        let mut job = SyncJob::new(&self.name, &self.source, &self.destination, mode)
            .with_context(|| format!("Invalid configuration for job '{}'", self.name))?
            .with_log_level(log_level)
            .with_date_format(date_format);

        let exclusions = job.exclusions_mut();
        exclusions.add_from_list(&defaults.global_excludes)?;
        exclusions.add_from_list(shared_excludes)?;
        exclusions.add_from_list(&self.exclude)?;

        Ok(job)
    }
}
