//! Stress coordinator - orchestrates the worker pool
//!
//! The coordinator is responsible for:
//! - Creating the root directory and the shared payload (startup fatal)
//! - Launching one worker per working directory
//! - Watching worker exits and applying the failure policy
//! - Draining: once the stop flag is set, waiting for every worker to
//!   finish its current cycle
//! - Final statistics

use crate::config::{FailurePolicy, StressConfig};
use crate::error::{Result, StressError, WorkerError};
use crate::payload::Payload;
use crate::stress::context::{CoordinatorState, StateCell, StopFlag, StopHandle, WorkerContext};
use crate::stress::worker::{aggregate_stats, DirectoryWorker, WorkerExit, WorkerSnapshot, WorkerStats};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the coordinator wakes up to check the stop flag and report progress
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a finished run
#[derive(Debug)]
pub struct StressResult {
    /// Number of workers launched
    pub workers: usize,

    /// Totals across all workers
    pub totals: WorkerSnapshot,

    /// Errors of workers that terminated abnormally, in the order observed
    pub failures: Vec<WorkerError>,

    /// Wall-clock start
    pub started_at: DateTime<Utc>,

    /// Time from launch to the end of the drain
    pub duration: Duration,

    /// Whether the run ended because a stop was requested (as opposed to
    /// every worker dying on its own)
    pub stop_requested: bool,

    /// Policy the run was made under
    pub failure_policy: FailurePolicy,
}

impl StressResult {
    /// No worker failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the process should exit successfully: no failures, or
    /// failures the policy tolerates
    pub fn exit_success(&self) -> bool {
        self.is_success() || !self.failure_policy.fails_process()
    }
}

/// Live counters for progress display
#[derive(Debug, Clone)]
pub struct StressProgress {
    pub totals: WorkerSnapshot,
    pub active_workers: usize,
    pub total_workers: usize,
    pub failed_workers: usize,
    pub state: CoordinatorState,
    pub elapsed: Duration,
}

impl StressProgress {
    /// Completed cycles per second across all workers
    pub fn cycles_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.totals.cycles as f64 / secs
        } else {
            0.0
        }
    }

    /// Files created per second across all workers
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.totals.files_created as f64 / secs
        } else {
            0.0
        }
    }
}

/// Read-only view of a running pool, for progress and diagnostics
#[derive(Debug, Clone)]
pub struct PoolMonitor {
    state: StateCell,
    stop: StopFlag,
    workers: Arc<Vec<Arc<WorkerStats>>>,
    started: Instant,
}

impl PoolMonitor {
    pub fn state(&self) -> CoordinatorState {
        self.state.get()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Per-worker counters, indexed by worker id
    pub fn workers(&self) -> Vec<WorkerSnapshot> {
        self.workers.iter().map(|s| s.snapshot()).collect()
    }

    pub fn progress(&self) -> StressProgress {
        let snapshots = self.workers();
        StressProgress {
            totals: aggregate_stats(self.workers.iter()),
            active_workers: snapshots.iter().filter(|s| s.active).count(),
            total_workers: snapshots.len(),
            failed_workers: snapshots.iter().filter(|s| s.failed).count(),
            state: self.state.get(),
            elapsed: self.started.elapsed(),
        }
    }
}

/// Coordinates the worker pool and the shutdown drain
pub struct StressCoordinator {
    /// Configuration
    config: Arc<StressConfig>,

    /// Shared payload
    payload: Payload,

    /// Stop signal
    stop: StopFlag,

    /// Lifecycle state
    state: StateCell,

    /// Per-worker counters, indexed by worker id
    stats: Arc<Vec<Arc<WorkerStats>>>,

    /// Creation time
    started: Instant,
}

impl StressCoordinator {
    /// Validate the configuration, then create the root directory and the
    /// shared payload.
    ///
    /// All three are fatal on failure; nothing has been launched yet.
    pub fn new(config: StressConfig) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.root).map_err(|source| StressError::RootCreate {
            path: config.root.clone(),
            source,
        })?;

        info!("filling random buffer");
        let payload = Payload::generate(config.max_file_size)?;
        debug!(bytes = payload.len(), "Payload ready");

        let stats = (0..config.max_dirs)
            .map(|_| Arc::new(WorkerStats::default()))
            .collect();

        Ok(Self {
            config: Arc::new(config),
            payload,
            stop: StopFlag::new(),
            state: StateCell::new(),
            stats: Arc::new(stats),
            started: Instant::now(),
        })
    }

    /// Handle for requesting a stop (signal handlers, tests)
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.stop.clone(), self.state.clone())
    }

    /// Get a handle on the lifecycle state
    pub fn state(&self) -> StateCell {
        self.state.clone()
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    /// Read-only view of the pool, usable from other threads
    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            state: self.state.clone(),
            stop: self.stop.clone(),
            workers: Arc::clone(&self.stats),
            started: self.started,
        }
    }

    /// Run until stopped, without progress reporting
    pub fn run(self) -> Result<StressResult> {
        self.run_with_monitor(|_| {})
    }

    /// Run until stopped. `on_tick` receives a [`PoolMonitor`] once right
    /// after launch and then on every poll interval.
    pub fn run_with_monitor<F>(self, mut on_tick: F) -> Result<StressResult>
    where
        F: FnMut(&PoolMonitor),
    {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            root = %self.config.root.display(),
            workers = self.config.max_dirs,
            files = self.config.max_files,
            max_file_size = self.config.max_file_size,
            "Starting stress test"
        );

        let (exit_tx, exit_rx) = unbounded::<WorkerExit>();
        let workers = self.spawn_workers(exit_tx)?;
        self.state.advance(CoordinatorState::Running);
        // A stop that landed during launch could not enter Draining yet
        self.stop_handle().sync_state();

        let monitor = self.monitor();
        on_tick(&monitor);

        let mut failures = self.wait_for_workers(&exit_rx, &monitor, &mut on_tick);

        // Every sender is gone, so every worker has left its loop
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                failures.push(e);
            }
        }

        self.state.advance(CoordinatorState::Stopped);
        let duration = start.elapsed();
        let totals = aggregate_stats(monitor.workers.iter());
        let stop_requested = self.stop.is_stopped();

        if !stop_requested {
            warn!(
                failures = failures.len(),
                "All workers terminated before a stop was requested"
            );
        } else if failures.is_empty() {
            info!(
                cycles = totals.cycles,
                duration_secs = duration.as_secs(),
                "run ended successfully"
            );
        } else {
            warn!(
                cycles = totals.cycles,
                failures = failures.len(),
                duration_secs = duration.as_secs(),
                "run ended with worker failures"
            );
        }

        Ok(StressResult {
            workers: self.config.max_dirs,
            totals,
            failures,
            started_at,
            duration,
            stop_requested,
            failure_policy: self.config.failure_policy,
        })
    }

    /// Spawn one worker per working directory
    fn spawn_workers(
        &self,
        exit_tx: crossbeam_channel::Sender<WorkerExit>,
    ) -> Result<Vec<DirectoryWorker>> {
        let mut workers = Vec::with_capacity(self.config.max_dirs);

        for id in 0..self.config.max_dirs {
            let ctx = WorkerContext::new(
                Arc::clone(&self.config),
                self.payload.clone(),
                self.stop.clone(),
            );

            let dir = self.config.worker_dir(id);
            let stats = Arc::clone(&self.stats[id]);
            match DirectoryWorker::spawn(id, dir, ctx, stats, exit_tx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Don't leave the already-running workers behind
                    self.stop.request_stop();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e.into());
                }
            }
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(workers)
    }

    /// Block until every worker has exited.
    ///
    /// Workers each hold a clone of the exit sender, so the channel
    /// disconnects exactly when the last worker is gone, including workers
    /// that panicked before reporting.
    fn wait_for_workers<F>(
        &self,
        exit_rx: &Receiver<WorkerExit>,
        monitor: &PoolMonitor,
        on_tick: &mut F,
    ) -> Vec<WorkerError>
    where
        F: FnMut(&PoolMonitor),
    {
        let mut failures = Vec::new();
        let stop = self.stop_handle();

        loop {
            match exit_rx.recv_timeout(POLL_INTERVAL) {
                Ok(WorkerExit::Stopped { id, runs }) => {
                    debug!(worker = id, runs, "Worker exited");
                }
                Ok(WorkerExit::Failed { id, error }) => {
                    warn!(worker = id, error = %error, "Worker failed");
                    failures.push(error);

                    if self.config.failure_policy.stops_siblings() && stop.request_stop() {
                        info!("Stopping remaining workers after failure");
                    }
                }
                Err(RecvTimeoutError::Timeout) => on_tick(monitor),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        failures
    }
}
