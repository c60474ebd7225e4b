// Sync Engine
// Recursive source -> destination mirroring with per-entry fault isolation

use anyhow::{anyhow, Context, Result};
use filetime::FileTime;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::{CancelHandle, ConfigurationError, LogCategory, SyncError, SyncJob, SyncMode};
use crate::utilities::{is_inside, mirror_path, versioned_path};

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Source files examined
    pub files_visited: usize,
    /// Source subdirectories entered
    pub directories_visited: usize,
    /// Files created in the destination
    pub files_copied: usize,
    /// Existing destination files overwritten
    pub files_updated: usize,
    /// Destination files renamed before being overwritten
    pub files_versioned: usize,
    pub files_deleted: usize,
    pub directories_deleted: usize,
    /// Entries skipped by an exclusion pattern
    pub excluded: usize,
    /// Entries that failed and were skipped
    pub errors: usize,
    /// Whether the run stopped early
    pub cancelled: bool,
}

impl SyncSummary {
    /// Number of destination mutations performed
    pub fn changes(&self) -> usize {
        self.files_copied + self.files_updated + self.files_deleted + self.directories_deleted
    }
}

/// Entries directly inside one directory, sorted by name
#[derive(Debug, Default)]
struct DirectoryListing {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,
}

impl DirectoryListing {
    fn read(dir: &Path) -> Result<Self> {
        let mut listing = Self::default();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            if entry.file_type().is_dir() {
                listing.directories.push(entry.into_path());
            } else {
                listing.files.push(entry.into_path());
            }
        }

        Ok(listing)
    }

    /// Like `read`, but a missing directory is empty
    fn read_if_exists(dir: &Path) -> Result<Self> {
        if dir.exists() {
            Self::read(dir)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// Performs one synchronization pass of a job
pub struct Synchronizer<'a> {
    job: &'a SyncJob,
    cancel: CancelHandle,
    summary: SyncSummary,
}

impl<'a> Synchronizer<'a> {
    pub fn new(job: &'a SyncJob) -> Self {
        Self {
            job,
            cancel: job.cancel_handle(),
            summary: SyncSummary::default(),
        }
    }

    /// Walk the whole tree, blocking until done or cancelled
    ///
    /// Only a vanished source root or an uncreatable destination root fail
    /// the run; everything else becomes an `Error` event.
    pub fn run(mut self) -> Result<SyncSummary, SyncError> {
        let job = self.job;
        let source = job.source();
        let destination = job.destination();

        if !source.is_dir() {
            return Err(ConfigurationError::SourceMissing(source.to_path_buf()).into());
        }
        fs::create_dir_all(destination).map_err(|e| SyncError::Io {
            path: destination.to_path_buf(),
            source: e,
        })?;

        info!(
            job = job.name(),
            source = %source.display(),
            destination = %destination.display(),
            mode = %job.mode(),
            "starting synchronization"
        );

        if let Err(e) = self.sync_directory(source, destination) {
            self.report_error(source, &e);
        }

        self.summary.cancelled = self.cancel.is_cancelled();
        let message = if self.summary.cancelled {
            format!("Synchronization of {} cancelled", source.display())
        } else {
            format!("Synchronization of {} finished", source.display())
        };
        job.emit(LogCategory::Finished, message);
        self.cancel.reset();

        info!(
            job = job.name(),
            copied = self.summary.files_copied,
            updated = self.summary.files_updated,
            versioned = self.summary.files_versioned,
            deleted = self.summary.files_deleted + self.summary.directories_deleted,
            errors = self.summary.errors,
            cancelled = self.summary.cancelled,
            "synchronization finished"
        );

        Ok(self.summary)
    }

    /// Reconcile one directory level, then recurse
    fn sync_directory(&mut self, source_dir: &Path, dest_dir: &Path) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let listing = DirectoryListing::read(source_dir)?;

        for file in &listing.files {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if self.is_excluded(file) {
                self.summary.excluded += 1;
                continue;
            }

            self.summary.files_visited += 1;
            self.job.emit(LogCategory::FileVisited, file.display().to_string());

            if let Err(e) = self.sync_file(file) {
                self.report_error(file, &e);
            }
        }

        if self.job.mode() == SyncMode::CopyAndDelete {
            self.remove_orphans(&listing.files, dest_dir, EntryKind::File);
        }

        for dir in &listing.directories {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if self.is_excluded(dir) {
                self.summary.excluded += 1;
                continue;
            }

            self.summary.directories_visited += 1;
            self.job.emit(LogCategory::DirectoryVisited, dir.display().to_string());

            if let Err(e) = self.enter_directory(dir) {
                self.report_error(dir, &e);
            }
        }

        if self.job.mode() == SyncMode::CopyAndDelete {
            self.remove_orphans(&listing.directories, dest_dir, EntryKind::Directory);
        }

        Ok(())
    }

    fn enter_directory(&mut self, dir: &Path) -> Result<()> {
        let target = self.mirror_of(dir)?;
        if !target.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            debug!(path = %target.display(), "created directory");
        }

        self.sync_directory(dir, &target)
    }

    /// Copy, overwrite, or version a single file
    fn sync_file(&mut self, source: &Path) -> Result<()> {
        let dest = self.mirror_of(source)?;
        let source_meta = fs::metadata(source)
            .with_context(|| format!("Failed to read metadata: {}", source.display()))?;
        let source_time = FileTime::from_last_modification_time(&source_meta);

        let dest_meta = match fs::metadata(&dest) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                copy_file(source, &dest, source_time)?;
                self.summary.files_copied += 1;
                debug!(from = %source.display(), to = %dest.display(), "copied new file");
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read metadata: {}", dest.display()));
            }
        };

        if FileTime::from_last_modification_time(&dest_meta) == source_time {
            return Ok(());
        }

        if self.job.mode() == SyncMode::CopyWithVersioning {
            let modified = dest_meta
                .modified()
                .with_context(|| format!("Failed to read modification time: {}", dest.display()))?;
            let backup = unique_versioned_path(&dest, &self.job.date_format().format_system_time(modified));
            fs::rename(&dest, &backup).with_context(|| {
                format!("Failed to rename {} to {}", dest.display(), backup.display())
            })?;
            self.summary.files_versioned += 1;
            debug!(from = %dest.display(), to = %backup.display(), "versioned previous file");
        }

        copy_file(source, &dest, source_time)?;
        self.summary.files_updated += 1;
        debug!(from = %source.display(), to = %dest.display(), "updated file");

        Ok(())
    }

    /// Delete destination entries of one kind that have no source entry of that kind
    fn remove_orphans(&mut self, source_entries: &[PathBuf], dest_dir: &Path, kind: EntryKind) {
        let dest_listing = match DirectoryListing::read_if_exists(dest_dir) {
            Ok(listing) => listing,
            Err(e) => {
                self.report_error(dest_dir, &e);
                return;
            }
        };

        let source_names: HashSet<OsString> = source_entries
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect();
        let candidates = match kind {
            EntryKind::File => dest_listing.files,
            EntryKind::Directory => dest_listing.directories,
        };

        for path in candidates {
            if self.cancel.is_cancelled() {
                return;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            if source_names.contains(name) || self.is_protected(&path) {
                continue;
            }

            let (result, category) = match kind {
                EntryKind::File => (fs::remove_file(&path), LogCategory::FileDeleted),
                EntryKind::Directory => (fs::remove_dir_all(&path), LogCategory::DirectoryDeleted),
            };

            match result {
                Ok(()) => {
                    match kind {
                        EntryKind::File => self.summary.files_deleted += 1,
                        EntryKind::Directory => self.summary.directories_deleted += 1,
                    }
                    debug!(path = %path.display(), "deleted destination-only entry");
                    self.job.emit(category, path.display().to_string());
                }
                Err(e) => {
                    let error = anyhow::Error::new(e).context(format!("Failed to delete: {}", path.display()));
                    self.report_error(&path, &error);
                }
            }
        }
    }

    /// Destination entries kept even when they have no source counterpart
    ///
    /// Patterns are written against source paths, so a destination entry is
    /// tested through its source-side counterpart.
    fn is_protected(&self, dest_path: &Path) -> bool {
        // The source tree may itself live inside the destination
        if is_inside(self.job.source(), dest_path) {
            return true;
        }
        mirror_path(self.job.destination(), self.job.source(), dest_path)
            .is_some_and(|source_path| self.job.exclusions().matches(&source_path))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.job.exclusions().matches(path)
    }

    fn mirror_of(&self, source_path: &Path) -> Result<PathBuf> {
        mirror_path(self.job.source(), self.job.destination(), source_path).ok_or_else(|| {
            anyhow!(
                "{} is not inside source root {}",
                source_path.display(),
                self.job.source().display()
            )
        })
    }

    fn report_error(&mut self, path: &Path, error: &anyhow::Error) {
        self.summary.errors += 1;
        warn!(job = self.job.name(), path = %path.display(), error = %format!("{:#}", error), "entry skipped");
        self.job.emit(LogCategory::Error, format!("{}: {:#}", path.display(), error));
    }
}

/// First free backup name: `<stem>_<stamp><.ext>`, then `<stem>_<stamp>_<n><.ext>`
fn unique_versioned_path(dest: &Path, stamp: &str) -> PathBuf {
    let mut backup = versioned_path(dest, stamp);
    let mut n = 1;
    while backup.symlink_metadata().is_ok() {
        backup = versioned_path(dest, &format!("{}_{}", stamp, n));
        n += 1;
    }
    backup
}

/// Copy content, then stamp the source's modification time on the copy
fn copy_file(source: &Path, dest: &Path, modified: FileTime) -> Result<()> {
    fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
    filetime::set_file_mtime(dest, modified)
        .with_context(|| format!("Failed to set modification time: {}", dest.display()))?;
    Ok(())
}

/// Run one synchronization pass of `job`
pub fn run(job: &SyncJob) -> Result<SyncSummary, SyncError> {
    Synchronizer::new(job).run()
}

impl SyncJob {
    /// Run one synchronization pass, blocking until done or cancelled
    pub fn run(&self) -> Result<SyncSummary, SyncError> {
        run(self)
    }
}
