//! Races against the real filesystem
//!
//! These tests use wall-clock polling and threads standing in for the
//! victim, so they run serially to keep timing stable.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use racer::{OpenCheck, OsFileSystem, Precondition, RaceError, RacePaths, Racer, SystemClock};
use serial_test::serial;
use tempfile::TempDir;

const INTERVAL: Duration = Duration::from_millis(100);

struct Workspace {
    _dir: TempDir,
    target: PathBuf,
    sensitive: PathBuf,
    temp: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let target = dir.path().join("example.txt");
        let sensitive = dir.path().join("sensitive.txt");
        let temp = dir.path().join("temp.txt");
        Self {
            _dir: dir,
            target,
            sensitive,
            temp,
        }
    }

    fn racer(&self, precondition: Precondition) -> Racer<OsFileSystem, SystemClock> {
        let paths = RacePaths::new(&self.target, &self.sensitive, &self.temp).unwrap();
        Racer::new(OsFileSystem, SystemClock::new(), paths)
            .with_poll_interval(INTERVAL)
            .with_precondition(precondition)
    }
}

#[test]
#[serial]
fn test_secret_replaces_public() {
    let ws = Workspace::new();
    fs::write(&ws.sensitive, "SECRET").unwrap();
    fs::write(&ws.target, "public").unwrap();

    let outcome = racer::run(&ws.target, &ws.sensitive, &ws.temp, INTERVAL, Precondition::default()).unwrap();

    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "SECRET");
    assert!(!ws.temp.exists());
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.bytes_copied, 6);
}

#[test]
#[serial]
fn test_detects_late_creation_within_one_interval() {
    let ws = Workspace::new();
    fs::write(&ws.sensitive, "SECRET").unwrap();

    let target = ws.target.clone();
    let temp = ws.temp.clone();
    let creator = thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        assert!(!temp.exists(), "racer staged before target existed");
        fs::write(&target, "public").unwrap();
        Instant::now()
    });

    let outcome = ws.racer(Precondition::Exists).run().unwrap();
    let finished = Instant::now();
    let created = creator.join().unwrap();

    assert!(outcome.detected_after >= Duration::from_secs(2));
    // One interval plus scheduler slack
    assert!(finished.duration_since(created) <= INTERVAL + Duration::from_millis(150));
    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "SECRET");
}

#[test]
#[serial]
fn test_locked_target_blocks_swap_until_released() {
    let ws = Workspace::new();
    fs::write(&ws.sensitive, "SECRET").unwrap();
    fs::write(&ws.target, "public").unwrap();

    let holder = OpenOptions::new().write(true).open(&ws.target).unwrap();
    FileExt::lock_exclusive(&holder).unwrap();

    let paths = RacePaths::new(&ws.target, &ws.sensitive, &ws.temp).unwrap();
    let handle = thread::spawn(move || {
        Racer::new(OsFileSystem, SystemClock::new(), paths)
            .with_poll_interval(Duration::from_millis(20))
            .with_precondition(Precondition::ExistsUnlocked(OpenCheck::Strict))
            .run()
    });

    thread::sleep(Duration::from_millis(300));
    assert!(!handle.is_finished());
    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "public");
    assert!(!ws.temp.exists());

    FileExt::unlock(&holder).unwrap();
    drop(holder);

    let outcome = handle.join().unwrap().unwrap();
    assert!(outcome.attempts > 1);
    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "SECRET");
}

#[test]
#[serial]
fn test_concurrent_reader_never_sees_partial_content() {
    let ws = Workspace::new();
    let before = vec![b'p'; 256 * 1024];
    let after = vec![b's'; 256 * 1024];
    fs::write(&ws.sensitive, &after).unwrap();
    fs::write(&ws.target, &before).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let stop = stop.clone();
        let target = ws.target.clone();
        let before = before.clone();
        let after = after.clone();
        thread::spawn(move || {
            let mut reads = 0u64;
            let mut saw_after = false;
            while !stop.load(Ordering::SeqCst) || !saw_after {
                let content = fs::read(&target).expect("target vanished during swap");
                assert!(content == before || content == after, "observed a torn read");
                saw_after |= content == after;
                reads += 1;
            }
            reads
        })
    };

    thread::sleep(Duration::from_millis(20));
    ws.racer(Precondition::Exists).run().unwrap();
    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::SeqCst);

    let reads = reader.join().unwrap();
    assert!(reads > 1);
}

#[test]
#[serial]
fn test_second_run_is_idempotent() {
    let ws = Workspace::new();
    fs::write(&ws.sensitive, "SECRET").unwrap();
    fs::write(&ws.target, "public").unwrap();

    let racer = ws.racer(Precondition::default());
    racer.run().unwrap();
    assert!(!ws.temp.exists());

    let outcome = racer.run().unwrap();
    assert_eq!(outcome.attempts, 1);
    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "SECRET");
    assert!(!ws.temp.exists());
}

#[test]
#[serial]
fn test_missing_sensitive_is_fatal() {
    let ws = Workspace::new();
    fs::write(&ws.target, "public").unwrap();

    let err = ws.racer(Precondition::Exists).run().unwrap_err();

    assert!(matches!(err, RaceError::Copy { .. }));
    assert_eq!(fs::read_to_string(&ws.target).unwrap(), "public");
    assert!(!ws.temp.exists());
}

#[test]
#[serial]
fn test_replace_failure_is_fatal_and_leaves_temp() {
    let ws = Workspace::new();
    fs::write(&ws.sensitive, "SECRET").unwrap();
    // A directory satisfies existence but cannot be replaced by a file
    fs::create_dir(&ws.target).unwrap();
    fs::write(ws.target.join("keep"), "x").unwrap();

    let err = ws.racer(Precondition::Exists).run().unwrap_err();

    assert!(matches!(err, RaceError::Replace { .. }));
    assert_eq!(err.stage(), "replace");
    assert!(ws.target.is_dir());
    assert_eq!(fs::read_to_string(&ws.temp).unwrap(), "SECRET");
}
