//! Directory worker
//!
//! Each worker:
//! - Owns one working directory (`root/<id>`)
//! - Runs churn cycles back to back until the stop flag is set
//! - Checks the stop flag only between cycles
//! - Terminates on the first failed filesystem operation, without cleanup
//! - Reports how it ended on the coordinator's exit channel

use crate::error::WorkerError;
use crate::stress::context::WorkerContext;
use crate::stress::cycle::{run_cycle, CycleDirs, CycleReport};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Completed cycles
    pub cycles: AtomicU64,

    /// Files created
    pub files_created: AtomicU64,

    /// Bytes written
    pub bytes_written: AtomicU64,

    /// Files renamed into dst
    pub files_moved: AtomicU64,

    /// Files deleted
    pub files_deleted: AtomicU64,

    /// Set while the worker thread is inside its loop
    pub active: AtomicBool,

    /// Set when the worker ended with an error
    pub failed: AtomicBool,
}

impl WorkerStats {
    fn record_cycle(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.files_created
            .fetch_add(report.files_created, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(report.bytes_written, Ordering::Relaxed);
        self.files_moved.fetch_add(report.files_moved, Ordering::Relaxed);
        self.files_deleted
            .fetch_add(report.files_deleted, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            files_created: self.files_created.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            files_moved: self.files_moved.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "debug-server", derive(serde::Serialize))]
pub struct WorkerSnapshot {
    pub cycles: u64,
    pub files_created: u64,
    pub bytes_written: u64,
    pub files_moved: u64,
    pub files_deleted: u64,
    pub active: bool,
    pub failed: bool,
}

/// How a worker left its loop
#[derive(Debug)]
pub enum WorkerExit {
    /// Saw the stop flag between cycles
    Stopped { id: usize, runs: u64 },

    /// A cycle failed
    Failed { id: usize, error: WorkerError },
}

impl WorkerExit {
    pub fn is_failure(&self) -> bool {
        matches!(self, WorkerExit::Failed { .. })
    }
}

/// A worker thread churning one directory
pub struct DirectoryWorker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl DirectoryWorker {
    /// Spawn a worker thread on `dir`, counting into `stats`; its exit is
    /// sent on `exit_tx`
    pub fn spawn(
        id: usize,
        dir: PathBuf,
        ctx: WorkerContext,
        stats: Arc<WorkerStats>,
        exit_tx: Sender<WorkerExit>,
    ) -> Result<Self, WorkerError> {
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("stress-{}", id))
            .spawn(move || {
                let exit = match worker_loop(id, &dir, &ctx, &stats_clone) {
                    Ok(runs) => WorkerExit::Stopped { id, runs },
                    Err(error) => {
                        stats_clone.failed.store(true, Ordering::Relaxed);
                        WorkerExit::Failed { id, error }
                    }
                };
                stats_clone.active.store(false, Ordering::Relaxed);

                // The coordinator may already be gone in tests
                let _ = exit_tx.send(exit);
            })
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &Arc<WorkerStats> {
        &self.stats
    }

    /// Wait for the worker thread to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|panic| WorkerError::Panicked {
                id: self.id,
                message: panic_message(&*panic),
            })
        } else {
            Ok(())
        }
    }
}

/// Main worker loop. Returns the number of completed cycles.
pub fn worker_loop(
    id: usize,
    dir: &Path,
    ctx: &WorkerContext,
    stats: &WorkerStats,
) -> Result<u64, WorkerError> {
    stats.active.store(true, Ordering::Relaxed);
    debug!(worker = id, dir = %dir.display(), "Worker starting");

    let dirs = CycleDirs::new(dir);
    let mut run = 0u64;

    while !ctx.stop.is_stopped() {
        debug!(dir = %dir.display(), run, "starting run");

        let report = match run_cycle(&dirs, ctx.config.max_files, &ctx.payload) {
            Ok(report) => report,
            Err(source) => {
                error!(
                    worker = id,
                    dir = %dir.display(),
                    path = %source.path().display(),
                    run,
                    error = %source,
                    "Cycle failed, worker terminating"
                );
                return Err(WorkerError::Cycle {
                    id,
                    dir: dir.to_path_buf(),
                    run,
                    source,
                });
            }
        };

        stats.record_cycle(&report);
        debug!(dir = %dir.display(), run, bytes = report.bytes_written, "finished run");
        run += 1;
    }

    info!(worker = id, runs = run, "Worker stopped");
    Ok(run)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Worker thread panicked".into()
    }
}

/// Sum snapshots from several workers
pub fn aggregate_stats<'a>(stats: impl IntoIterator<Item = &'a Arc<WorkerStats>>) -> WorkerSnapshot {
    stats
        .into_iter()
        .map(|s| s.snapshot())
        .fold(WorkerSnapshot::default(), |acc, s| WorkerSnapshot {
            cycles: acc.cycles + s.cycles,
            files_created: acc.files_created + s.files_created,
            bytes_written: acc.bytes_written + s.bytes_written,
            files_moved: acc.files_moved + s.files_moved,
            files_deleted: acc.files_deleted + s.files_deleted,
            active: acc.active || s.active,
            failed: acc.failed || s.failed,
        })
}
