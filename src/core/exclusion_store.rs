// Exclusion Store
// Keyed persistence of exclusion patterns, one list per job name

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Loads and saves the exclusion list stored under a job name
///
/// Jobs created with the same name pick up the same patterns. Loaded lines
/// may contain comments; callers filter them.
pub trait ExclusionStore: Send + Sync {
    fn load(&self, job: &str) -> Result<Vec<String>>;

    fn save(&self, job: &str, patterns: &[String]) -> Result<()>;
}

/// Process-local store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryExclusionStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryExclusionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExclusionStore for MemoryExclusionStore {
    fn load(&self, job: &str) -> Result<Vec<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("exclusion store lock poisoned"))?;
        Ok(entries.get(job).cloned().unwrap_or_default())
    }

    fn save(&self, job: &str, patterns: &[String]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("exclusion store lock poisoned"))?;
        entries.insert(job.to_string(), patterns.to_vec());
        Ok(())
    }
}

/// Plain-text store: `<dir>/<job>.exclude`, one pattern per line
///
/// Lines starting with `;` or `#` are comments. A missing file is an empty list.
#[derive(Debug, Clone)]
pub struct FileExclusionStore {
    dir: PathBuf,
}

impl FileExclusionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the patterns of a job
    pub fn path_for(&self, job: &str) -> PathBuf {
        let file_name: String = job
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.exclude", file_name))
    }
}

impl ExclusionStore for FileExclusionStore {
    fn load(&self, job: &str) -> Result<Vec<String>> {
        let path = self.path_for(job);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read exclusions: {}", path.display())),
        }
    }

    fn save(&self, job: &str, patterns: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        let mut content = format!("; exclusion patterns for job '{}'\n", job);
        for pattern in patterns {
            content.push_str(pattern);
            content.push('\n');
        }

        let path = self.path_for(job);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write exclusions: {}", path.display()))?;

        Ok(())
    }
}
