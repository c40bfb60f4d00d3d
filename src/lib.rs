//! disktroyer - Filesystem Churn Generator
//!
//! A tool for stressing a filesystem with sustained, concurrent metadata
//! churn. It runs until interrupted, then drains cleanly.
//!
//! # Features
//!
//! - **One Worker per Directory**: each worker owns `root/<id>` and never
//!   touches another worker's files.
//!
//! - **Metadata Heavy Cycles**: create, readdir, rename, readdir, unlink and
//!   rmdir in a fixed order, over and over.
//!
//! - **Shared Random Payload**: file contents come from one buffer of
//!   cryptographically random bytes, generated once at startup.
//!
//! - **Graceful Drain**: Ctrl-C sets a stop flag; every worker finishes its
//!   current cycle so no half-torn-down directories are left behind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     StressCoordinator                           │
//! │   create root · fill payload · launch · drain on stop flag      │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!       ┌───────────────────────┼───────────────────────┐
//!       ▼                       ▼                       ▼
//! ┌───────────┐           ┌───────────┐           ┌───────────┐
//! │ Worker 0  │           │ Worker 1  │    ...    │ Worker N  │
//! │ mkdir     │           │ mkdir     │           │ mkdir     │
//! │ create×n  │           │ create×n  │           │ create×n  │
//! │ rename×n  │           │ rename×n  │           │ rename×n  │
//! │ unlink×n  │           │ unlink×n  │           │ unlink×n  │
//! │ rmdir     │           │ rmdir     │           │ rmdir     │
//! └───────────┘           └───────────┘           └───────────┘
//!       │                       │                       │
//!       ▼                       ▼                       ▼
//!    root/0                  root/1                  root/N
//! ```
//!
//! # Example
//!
//! ```bash
//! # Defaults: 16 workers, 100 files of up to 64 KiB per cycle, ./disktroyer
//! disktroyer
//!
//! # Hammer an NFS mount with 64 workers
//! disktroyer -r /mnt/nfs/stress -d 64 -f 1000 -v
//! ```

pub mod config;
pub mod error;
pub mod payload;
pub mod progress;
pub mod stress;

#[cfg(feature = "debug-server")]
pub mod server;

pub use config::{CliArgs, FailurePolicy, StressConfig};
pub use error::{CycleError, Result, StressError, WorkerError};
pub use payload::Payload;
pub use stress::{StopFlag, StopHandle, StressCoordinator, StressResult};
