//! Concurrent churn engine
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │      StressCoordinator       │
//!                 │  - root dir + payload        │
//!                 │  - stop flag / drain         │
//!                 └──────────────┬───────────────┘
//!                                │ WorkerContext (config, payload, stop)
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!  ┌─────▼─────┐           ┌─────▼─────┐           ┌─────▼─────┐
//!  │ Worker 0  │           │ Worker 1  │           │ Worker N  │
//!  │ root/0    │           │ root/1    │           │ root/N    │
//!  │ src → dst │           │ src → dst │           │ src → dst │
//!  └─────┬─────┘           └─────┬─────┘           └─────┬─────┘
//!        └───────────────────────┼───────────────────────┘
//!                                ▼
//!                     exit channel (crossbeam)
//! ```

pub mod context;
pub mod coordinator;
pub mod cycle;
pub mod worker;

pub use context::{CoordinatorState, StateCell, StopFlag, StopHandle, WorkerContext};
pub use coordinator::{PoolMonitor, StressCoordinator, StressProgress, StressResult};
pub use cycle::{run_cycle, CycleDirs, CycleReport};
pub use worker::{DirectoryWorker, WorkerExit, WorkerSnapshot, WorkerStats};
