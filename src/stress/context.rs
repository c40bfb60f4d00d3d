//! Shared run context: stop flag, coordinator state and the per-worker bundle
//! of configuration, payload and stop flag.

use crate::config::StressConfig;
use crate::payload::Payload;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

/// One-way stop signal shared by the coordinator and every worker
///
/// Written once (false -> true), polled by workers at cycle boundaries.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    inner: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Returns `true` only for the call that flipped the flag.
    pub fn request_stop(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CoordinatorState {
    /// Created, no workers launched
    Idle = 0,
    /// Workers active, stop flag clear
    Running = 1,
    /// Stop flag set, waiting for outstanding workers
    Draining = 2,
    /// All workers exited
    Stopped = 3,
}

impl CoordinatorState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => CoordinatorState::Idle,
            1 => CoordinatorState::Running,
            2 => CoordinatorState::Draining,
            _ => CoordinatorState::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Running => "running",
            CoordinatorState::Draining => "draining",
            CoordinatorState::Stopped => "stopped",
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: CoordinatorState) -> bool {
        matches!(
            (self, next),
            (CoordinatorState::Idle, CoordinatorState::Running)
                | (CoordinatorState::Running, CoordinatorState::Draining)
                | (CoordinatorState::Running, CoordinatorState::Stopped)
                | (CoordinatorState::Draining, CoordinatorState::Stopped)
        )
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinator state readable from other threads
#[derive(Debug, Clone)]
pub struct StateCell {
    inner: Arc<AtomicU8>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(CoordinatorState::Idle as u8)),
        }
    }

    pub fn get(&self) -> CoordinatorState {
        CoordinatorState::from_u8(self.inner.load(Ordering::SeqCst))
    }

    /// Move to `next` if that is a legal transition from the current state.
    /// Returns whether the state changed.
    pub fn advance(&self, next: CoordinatorState) -> bool {
        let mut current = self.inner.load(Ordering::SeqCst);
        loop {
            if !CoordinatorState::from_u8(current).can_transition_to(next) {
                return false;
            }
            match self.inner.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop flag paired with the coordinator state it drives
///
/// Requesting a stop through the handle moves a running coordinator to
/// `Draining` immediately, so the state never lags behind the flag.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop: StopFlag,
    state: StateCell,
}

impl StopHandle {
    pub fn new(stop: StopFlag, state: StateCell) -> Self {
        Self { stop, state }
    }

    /// Set the stop flag and enter `Draining` if running. Returns `true`
    /// only for the call that flipped the flag.
    pub fn request_stop(&self) -> bool {
        let first = self.stop.request_stop();
        self.sync_state();
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Enter `Draining` if the flag is set and the coordinator is running.
    ///
    /// Called again by the coordinator right after it reaches `Running`,
    /// which covers a stop requested while workers were being launched.
    pub(crate) fn sync_state(&self) {
        if self.stop.is_stopped() && self.state.advance(CoordinatorState::Draining) {
            info!("flushing...");
        }
    }
}

/// Everything a worker needs, handed over at launch
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub config: Arc<StressConfig>,
    pub payload: Payload,
    pub stop: StopFlag,
}

impl WorkerContext {
    pub fn new(config: Arc<StressConfig>, payload: Payload, stop: StopFlag) -> Self {
        Self {
            config,
            payload,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_flag_first_request_wins() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!flag.is_stopped());

        assert!(other.request_stop());
        assert!(!flag.request_stop());
        assert!(flag.is_stopped());
        assert!(other.is_stopped());
    }

    #[test]
    fn test_stop_handle_drains_running_state_at_once() {
        let state = StateCell::new();
        let handle = StopHandle::new(StopFlag::new(), state.clone());
        state.advance(CoordinatorState::Running);

        assert!(handle.request_stop());
        assert_eq!(state.get(), CoordinatorState::Draining);
        assert!(!handle.request_stop());
        assert_eq!(state.get(), CoordinatorState::Draining);
    }

    #[test]
    fn test_stop_handle_before_launch_drains_on_sync() {
        let state = StateCell::new();
        let handle = StopHandle::new(StopFlag::new(), state.clone());

        // Not running yet: only the flag changes
        assert!(handle.request_stop());
        assert_eq!(state.get(), CoordinatorState::Idle);

        state.advance(CoordinatorState::Running);
        handle.sync_state();
        assert_eq!(state.get(), CoordinatorState::Draining);
    }

    #[test]
    fn test_stop_handle_after_stopped_is_noop() {
        let state = StateCell::new();
        let handle = StopHandle::new(StopFlag::new(), state.clone());
        state.advance(CoordinatorState::Running);
        state.advance(CoordinatorState::Stopped);

        assert!(handle.request_stop());
        assert_eq!(state.get(), CoordinatorState::Stopped);
    }

    #[test]
    fn test_state_transitions() {
        let state = StateCell::new();
        assert_eq!(state.get(), CoordinatorState::Idle);

        assert!(!state.advance(CoordinatorState::Draining));
        assert!(state.advance(CoordinatorState::Running));
        assert!(state.advance(CoordinatorState::Draining));
        // Repeated interrupts while draining do nothing
        assert!(!state.advance(CoordinatorState::Draining));
        assert!(state.advance(CoordinatorState::Stopped));
        assert!(!state.advance(CoordinatorState::Running));
        assert_eq!(state.get(), CoordinatorState::Stopped);
    }

    #[test]
    fn test_running_can_stop_without_drain() {
        let state = StateCell::new();
        state.advance(CoordinatorState::Running);
        assert!(state.advance(CoordinatorState::Stopped));
        assert_eq!(state.get().to_string(), "stopped");
    }
}
