//! Error types for disktroyer
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Payload (entropy) errors
//! - Per-cycle filesystem errors
//! - Worker thread errors
//!
//! Startup errors (`Config`, `Payload`, `RootCreate`) end the process before
//! any worker runs. Cycle errors are local to one worker.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for disktroyer
#[derive(Error, Debug)]
pub enum StressError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Payload generation errors
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Root directory could not be created
    #[error("Failed to create root directory '{}': {source}", path.display())]
    RootCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid files-per-cycle count
    #[error("Invalid file count {count}: must be between 1 and {max}")]
    InvalidFileCount { count: usize, max: usize },

    /// Invalid maximum file size
    #[error("Invalid file size {size}: must be between 1 and {max} bytes")]
    InvalidFileSize { size: usize, max: usize },

    /// Empty root path
    #[error("Root directory must not be empty")]
    EmptyRoot,
}

/// Shared payload errors
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Zero-length payload requested
    #[error("Payload size must be positive")]
    Empty,

    /// The entropy source could not fill the buffer
    #[error("Failed to read {len} random bytes: {source}")]
    Entropy {
        len: usize,
        #[source]
        source: io::Error,
    },
}

/// A single failed filesystem operation inside a churn cycle
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Failed to create directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to create file '{}': {source}", path.display())]
    CreateFile { path: PathBuf, source: io::Error },

    #[error("Failed to write {len} bytes to '{}': {source}", path.display())]
    WriteFile {
        path: PathBuf,
        len: usize,
        source: io::Error,
    },

    #[error("Failed to read directory '{}': {source}", path.display())]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("Failed to rename '{}' to '{}': {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to remove file '{}': {source}", path.display())]
    RemoveFile { path: PathBuf, source: io::Error },

    #[error("Failed to remove directory '{}': {source}", path.display())]
    RemoveDir { path: PathBuf, source: io::Error },
}

impl CycleError {
    /// Path of the entry the failing operation was applied to
    pub fn path(&self) -> &Path {
        match self {
            CycleError::CreateDir { path, .. }
            | CycleError::CreateFile { path, .. }
            | CycleError::WriteFile { path, .. }
            | CycleError::ReadDir { path, .. }
            | CycleError::RemoveFile { path, .. }
            | CycleError::RemoveDir { path, .. } => path,
            CycleError::Rename { from, .. } => from,
        }
    }

    /// Underlying OS error kind
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            CycleError::CreateDir { source, .. }
            | CycleError::CreateFile { source, .. }
            | CycleError::WriteFile { source, .. }
            | CycleError::ReadDir { source, .. }
            | CycleError::Rename { source, .. }
            | CycleError::RemoveFile { source, .. }
            | CycleError::RemoveDir { source, .. } => source.kind(),
        }
    }
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be started
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// A cycle failed and the worker terminated
    #[error("Worker {id} ({}) failed on run {run}: {source}", dir.display())]
    Cycle {
        id: usize,
        dir: PathBuf,
        run: u64,
        #[source]
        source: CycleError,
    },
}

impl WorkerError {
    /// Id of the worker this error belongs to
    pub fn worker_id(&self) -> usize {
        match self {
            WorkerError::Panicked { id, .. }
            | WorkerError::SpawnFailed { id, .. }
            | WorkerError::Cycle { id, .. } => *id,
        }
    }
}

/// Diagnostic endpoint errors
#[cfg(feature = "debug-server")]
#[derive(Error, Debug)]
pub enum ServerError {
    /// Bind/accept failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Could not start the background runtime
    #[error("Failed to start server runtime: {0}")]
    Runtime(String),
}

/// Result type alias for StressError
pub type Result<T> = std::result::Result<T, StressError>;

/// Result type alias for CycleError
pub type CycleResult<T> = std::result::Result<T, CycleError>;
