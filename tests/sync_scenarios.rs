// End-to-end synchronization scenarios
// Each test builds a scratch source/destination pair and runs one job

use filetime::FileTime;
use mirror_sync::{FileExclusionStore, LogCategory, LogEvent, LogLevelMask, SyncJob, SyncMode};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const OLD: i64 = 1_600_000_000; // 2020-09-13 12:26:40 UTC
const NEW: i64 = 1_700_000_000;

fn create_test_file(path: &Path, content: &str, unix_secs: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

fn roots() -> (TempDir, PathBuf, PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("source");
    let dest = temp.path().join("destination");
    fs::create_dir_all(&source).unwrap();
    (temp, source, dest)
}

fn record_events(job: &mut SyncJob) -> Arc<Mutex<Vec<LogEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    job.subscribe_all(move |e| sink.lock().unwrap().push(e.clone()));
    events
}

#[test]
fn scenario_a_new_file_is_copied() {
    let (_temp, source, dest) = roots();
    create_test_file(&source.join("a.txt"), "hello", OLD);

    let job = SyncJob::new("scenario-a", &source, &dest, SyncMode::Copy).unwrap();
    let summary = job.run().unwrap();

    assert_eq!(summary.files_copied, 1);
    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "hello");
    assert_eq!(mtime(&dest.join("a.txt")), mtime(&source.join("a.txt")));

    // Running again changes nothing
    let again = job.run().unwrap();
    assert_eq!(again.changes(), 0);
}

#[test]
fn scenario_b_unchanged_file_is_only_visited() {
    let (_temp, source, dest) = roots();
    create_test_file(&source.join("a.txt"), "same", OLD);
    create_test_file(&dest.join("a.txt"), "same", OLD);

    let mut job = SyncJob::new("scenario-b", &source, &dest, SyncMode::Copy)
        .unwrap()
        .with_log_level(LogLevelMask::ALL);
    let events = record_events(&mut job);
    let summary = job.run().unwrap();

    assert_eq!(summary.changes(), 0);
    assert_eq!(mtime(&dest.join("a.txt")), FileTime::from_unix_time(OLD, 0));

    let categories: Vec<LogCategory> = events.lock().unwrap().iter().map(|e| e.category).collect();
    assert_eq!(categories, vec![LogCategory::FileVisited, LogCategory::Finished]);
}

#[test]
fn scenario_c_stale_file_is_deleted() {
    let (_temp, source, dest) = roots();
    create_test_file(&source.join("keep.txt"), "keep", OLD);
    create_test_file(&dest.join("stale.txt"), "stale", OLD);

    let mut job = SyncJob::new("scenario-c", &source, &dest, SyncMode::CopyAndDelete)
        .unwrap()
        .with_log_level(LogLevelMask::of(&[LogCategory::FileDeleted]));
    let events = record_events(&mut job);
    job.run().unwrap();

    assert!(!dest.join("stale.txt").exists());
    assert!(dest.join("keep.txt").exists());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, LogCategory::FileDeleted);
    assert!(events[0].message.ends_with("stale.txt"));
    assert_eq!(events[0].job, "scenario-c");
}

#[test]
fn scenario_d_modified_file_is_versioned() {
    let (_temp, source, dest) = roots();
    create_test_file(&source.join("b.txt"), "new content", NEW);
    create_test_file(&dest.join("b.txt"), "old content", OLD);

    let job = SyncJob::new("scenario-d", &source, &dest, SyncMode::CopyWithVersioning)
        .unwrap()
        .with_date_format("yyyyMMddhhmmss");
    job.run().unwrap();

    let backup = dest.join("b_20200913122640.txt");
    assert_eq!(fs::read_to_string(&backup).unwrap(), "old content");
    assert_eq!(fs::read_to_string(dest.join("b.txt")).unwrap(), "new content");
    assert_eq!(mtime(&dest.join("b.txt")), FileTime::from_unix_time(NEW, 0));

    let versions = fs::read_dir(&dest).unwrap().count();
    assert_eq!(versions, 2);
}

#[test]
fn scenario_e_excluded_files_are_skipped() {
    let (_temp, source, dest) = roots();
    create_test_file(&source.join("x.tmp"), "scratch", OLD);
    create_test_file(&source.join("x.txt"), "keep", OLD);

    let mut job = SyncJob::new("scenario-e", &source, &dest, SyncMode::Copy)
        .unwrap()
        .with_log_level(LogLevelMask::ALL);
    job.exclusions_mut().add(r".*\.tmp$").unwrap();
    let events = record_events(&mut job);
    let summary = job.run().unwrap();

    assert!(dest.join("x.txt").exists());
    assert!(!dest.join("x.tmp").exists());
    assert_eq!(summary.excluded, 1);
    assert!(events.lock().unwrap().iter().all(|e| !e.message.contains("x.tmp")));
}

#[test]
fn repeated_root_names_mirror_correctly() {
    let (_temp, source, dest) = roots();
    // The source root's own name appears again below it
    create_test_file(&source.join("source/source/deep.txt"), "deep", OLD);

    let job = SyncJob::new("nested-names", &source, &dest, SyncMode::Copy).unwrap();
    job.run().unwrap();

    assert_eq!(fs::read_to_string(dest.join("source/source/deep.txt")).unwrap(), "deep");
}

#[test]
fn same_name_reuses_stored_exclusions() {
    let (temp, source, dest) = roots();
    let store = FileExclusionStore::new(temp.path().join("exclusions"));
    create_test_file(&source.join("notes.bak"), "b", OLD);
    create_test_file(&source.join("notes.md"), "m", OLD);

    let mut first = SyncJob::new("notes", &source, &dest, SyncMode::Copy).unwrap();
    first.exclusions_mut().add_from_source(["; backups", r"\.bak$"]).unwrap();
    first.save_exclusions(&store).unwrap();
    drop(first);

    let mut second = SyncJob::new("notes", &source, &dest, SyncMode::Copy).unwrap();
    second.load_exclusions(&store).unwrap();
    second.run().unwrap();

    assert!(dest.join("notes.md").exists());
    assert!(!dest.join("notes.bak").exists());
}
