//! Integration tests for disktroyer
//!
//! These run real workers against temporary directories on the local
//! filesystem, with small file counts and sizes.

use disktroyer::config::{FailurePolicy, StressConfig};
use disktroyer::payload::Payload;
use disktroyer::stress::cycle::{
    create_dirs, create_files, delete_files, list_entries, relocate_files, remove_dirs,
};
use disktroyer::stress::{CoordinatorState, CycleDirs, StressCoordinator};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn names(dir: &Path) -> BTreeSet<String> {
    list_entries(dir)
        .unwrap()
        .into_iter()
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_example_scenario_two_workers() {
    // max_dirs=2, max_files=3, max_file_size=10
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("t");
    let coordinator = StressCoordinator::new(StressConfig {
        root: root.clone(),
        max_dirs: 2,
        max_files: 3,
        max_file_size: 10,
        ..StressConfig::default()
    })
    .unwrap();

    let stop = coordinator.stop_handle();
    let result = coordinator
        .run_with_monitor(|monitor| {
            let workers = monitor.workers();
            if workers.iter().all(|w| w.cycles >= 1) {
                stop.request_stop();
            }
        })
        .unwrap();

    assert!(result.is_success());
    assert!(result.stop_requested);
    assert_eq!(result.totals.files_created, result.totals.cycles * 3);
    assert_eq!(result.totals.files_moved, result.totals.files_created);
    assert_eq!(result.totals.files_deleted, result.totals.files_created);
    assert!(result.totals.bytes_written <= result.totals.files_created * 9);

    assert_eq!(names(&root), BTreeSet::from(["0".to_string(), "1".to_string()]));
    for id in ["0", "1"] {
        assert!(names(&root.join(id)).is_empty());
    }
}

#[test]
fn test_cycle_steps_match_scenario() {
    let tmp = tempdir().unwrap();
    let dirs = CycleDirs::new(tmp.path().join("0"));
    let payload = Payload::generate(10).unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    let expected: BTreeSet<String> = ["0", "1", "2"].iter().map(|s| s.to_string()).collect();

    create_dirs(&dirs).unwrap();
    assert!(dirs.src.is_dir() && dirs.dst.is_dir());

    create_files(&dirs.src, 3, &payload, &mut rng).unwrap();
    assert_eq!(names(&dirs.src), expected);
    for name in &expected {
        assert!(fs::metadata(dirs.src.join(name)).unwrap().len() < 10);
    }

    relocate_files(&dirs.src, &dirs.dst).unwrap();
    assert!(names(&dirs.src).is_empty());
    assert_eq!(names(&dirs.dst), expected);

    delete_files(&dirs.dst).unwrap();
    assert!(names(&dirs.dst).is_empty());

    remove_dirs(&dirs).unwrap();
    assert!(!dirs.src.exists() && !dirs.dst.exists());
    assert!(names(&dirs.root).is_empty());
}

#[test]
fn test_many_workers_do_not_interfere() {
    let tmp = tempdir().unwrap();
    let coordinator = StressCoordinator::new(StressConfig {
        root: tmp.path().to_path_buf(),
        max_dirs: 8,
        max_files: 5,
        max_file_size: 256,
        failure_policy: FailurePolicy::Abort,
        ..StressConfig::default()
    })
    .unwrap();

    let stop = coordinator.stop_handle();
    let result = coordinator
        .run_with_monitor(|monitor| {
            if monitor.workers().iter().all(|w| w.cycles >= 5) {
                stop.request_stop();
            }
        })
        .unwrap();

    assert!(result.is_success(), "failures: {:?}", result.failures);
    assert!(result.totals.cycles >= 8 * 5);
    assert_eq!(names(tmp.path()).len(), 8);
}

#[test]
fn test_at_most_one_cycle_after_stop() {
    let tmp = tempdir().unwrap();
    let coordinator = StressCoordinator::new(StressConfig {
        root: tmp.path().to_path_buf(),
        max_dirs: 4,
        max_files: 10,
        max_file_size: 64,
        ..StressConfig::default()
    })
    .unwrap();

    let monitor = coordinator.monitor();
    let stop = coordinator.stop_handle();
    let runner = thread::spawn(move || coordinator.run().unwrap());

    while monitor.progress().totals.cycles < 8 {
        thread::sleep(Duration::from_millis(5));
    }
    // Anything counted after this point was already in flight
    stop.request_stop();
    let at_stop = monitor.workers();

    let result = runner.join().unwrap();
    let after = monitor.workers();

    assert!(result.is_success());
    assert_eq!(monitor.state(), CoordinatorState::Stopped);
    for (before, after) in at_stop.iter().zip(after.iter()) {
        assert!(after.cycles <= before.cycles + 1);
        assert!(!after.active);
    }
}

#[test]
fn test_stop_before_launch_runs_nothing() {
    let tmp = tempdir().unwrap();
    let coordinator = StressCoordinator::new(StressConfig {
        root: tmp.path().to_path_buf(),
        max_dirs: 2,
        max_files: 3,
        max_file_size: 10,
        ..StressConfig::default()
    })
    .unwrap();

    coordinator.stop_handle().request_stop();
    let result = coordinator.run().unwrap();

    assert!(result.is_success());
    assert_eq!(result.totals.cycles, 0);
    assert!(names(tmp.path()).is_empty());
}

#[test]
fn test_failed_worker_leaves_its_directory_untouched() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();

    // Leftover from an earlier aborted run: a non-empty dst
    let dst = root.join("0").join("dst");
    fs::create_dir_all(&dst).unwrap();
    fs::create_dir(dst.join("0")).unwrap();
    fs::write(dst.join("0").join("stale"), b"x").unwrap();

    let coordinator = StressCoordinator::new(StressConfig {
        root: root.clone(),
        max_dirs: 1,
        max_files: 2,
        max_file_size: 8,
        ..StressConfig::default()
    })
    .unwrap();

    let result = coordinator.run().unwrap();

    // The rename onto a non-empty directory fails, and nothing is cleaned up
    assert_eq!(result.failures.len(), 1);
    assert!(!result.stop_requested);
    // Default policy: the failure is reported but the exit status stays clean
    assert!(result.exit_success());
    assert!(root.join("0").join("src").exists());
    assert!(dst.join("0").join("stale").exists());
}
