//! Configuration types for disktroyer
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 4096;

/// Maximum files created per cycle
const MAX_FILES_PER_CYCLE: usize = 1_000_000;

/// Maximum file size (the payload is held in memory)
const MAX_FILE_SIZE: usize = 1024 * 1024 * 1024;

pub const DEFAULT_ROOT: &str = "disktroyer";
pub const DEFAULT_MAX_DIRS: usize = 16;
pub const DEFAULT_MAX_FILE_SIZE: usize = 64 * 1024;
pub const DEFAULT_MAX_FILES: usize = 100;

#[cfg(feature = "debug-server")]
pub const DEFAULT_DEBUG_ADDR: &str = "localhost:6060";

/// Filesystem churn generator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "disktroyer",
    version,
    about = "Filesystem churn generator for disk stress testing",
    long_about = "Runs one worker per working directory. Each worker repeatedly creates files \
                  in src/, renames them into dst/, deletes them and removes both directories.\n\n\
                  Runs until interrupted with Ctrl-C, then lets every worker finish its \
                  current cycle before exiting.",
    after_help = "EXAMPLES:\n    \
        disktroyer\n    \
        disktroyer -r /mnt/nfs/stress -d 64 -f 1000\n    \
        disktroyer --max-file-size 1048576 --max-files 10 -v\n    \
        disktroyer -d 8 --on-worker-error abort\n    \
        disktroyer --on-worker-error fail"
)]
pub struct CliArgs {
    /// Root directory for the test
    #[arg(short, long, default_value = DEFAULT_ROOT, value_name = "DIR")]
    pub root: PathBuf,

    /// Number of working directories (one worker each)
    #[arg(
        short = 'd',
        long,
        visible_alias = "maxdirs",
        default_value_t = DEFAULT_MAX_DIRS,
        value_name = "NUM"
    )]
    pub max_dirs: usize,

    /// Maximum file size in bytes
    #[arg(
        short = 's',
        long,
        visible_alias = "maxfilesize",
        default_value_t = DEFAULT_MAX_FILE_SIZE,
        value_name = "BYTES"
    )]
    pub max_file_size: usize,

    /// Number of files created per directory per cycle
    #[arg(
        short = 'f',
        long,
        visible_alias = "maxfiles",
        default_value_t = DEFAULT_MAX_FILES,
        value_name = "NUM"
    )]
    pub max_files: usize,

    /// Verbose output (log every cycle step)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Quiet mode - suppress header, progress and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// What to do when a worker fails
    #[arg(long, value_enum, default_value_t = FailurePolicy::Continue, value_name = "POLICY")]
    pub on_worker_error: FailurePolicy,

    /// Serve diagnostics over HTTP while running
    #[cfg(feature = "debug-server")]
    #[arg(long)]
    pub debug: bool,

    /// Address for the diagnostics endpoint
    #[cfg(feature = "debug-server")]
    #[arg(long, default_value = DEFAULT_DEBUG_ADDR, value_name = "ADDR")]
    pub debug_addr: String,
}

/// How the coordinator reacts to a worker that terminated with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// Log the failure, keep the other workers running, exit 0 after the drain
    #[default]
    Continue,
    /// Like `continue`, but exit non-zero after the drain
    Fail,
    /// Log the failure, stop every worker, drain and exit non-zero
    Abort,
}

impl FailurePolicy {
    /// Whether one failed worker stops its siblings
    pub fn stops_siblings(self) -> bool {
        matches!(self, FailurePolicy::Abort)
    }

    /// Whether a run with failed workers ends with a failing exit status
    pub fn fails_process(self) -> bool {
        !matches!(self, FailurePolicy::Continue)
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Root directory holding one subdirectory per worker
    pub root: PathBuf,

    /// Number of workers / working directories
    pub max_dirs: usize,

    /// Files created per cycle
    pub max_files: usize,

    /// Upper bound (exclusive) for file sizes, and the payload length
    pub max_file_size: usize,

    /// Verbose logging
    pub verbose: bool,

    /// Show header, spinner and summary
    pub show_progress: bool,

    /// Reaction to worker failures
    pub failure_policy: FailurePolicy,

    /// Diagnostics endpoint address, when enabled
    #[cfg(feature = "debug-server")]
    pub debug_addr: Option<String>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            max_dirs: DEFAULT_MAX_DIRS,
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            verbose: false,
            show_progress: false,
            failure_policy: FailurePolicy::Continue,
            #[cfg(feature = "debug-server")]
            debug_addr: None,
        }
    }
}

impl StressConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let config = Self {
            root: args.root,
            max_dirs: args.max_dirs,
            max_files: args.max_files,
            max_file_size: args.max_file_size,
            verbose: args.verbose,
            show_progress: !args.quiet,
            failure_policy: args.on_worker_error,
            #[cfg(feature = "debug-server")]
            debug_addr: args.debug.then_some(args.debug_addr),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check every bound the workers rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }

        if self.max_dirs == 0 || self.max_dirs > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.max_dirs,
                max: MAX_WORKERS,
            });
        }

        if self.max_files == 0 || self.max_files > MAX_FILES_PER_CYCLE {
            return Err(ConfigError::InvalidFileCount {
                count: self.max_files,
                max: MAX_FILES_PER_CYCLE,
            });
        }

        if self.max_file_size == 0 || self.max_file_size > MAX_FILE_SIZE {
            return Err(ConfigError::InvalidFileSize {
                size: self.max_file_size,
                max: MAX_FILE_SIZE,
            });
        }

        Ok(())
    }

    /// Working directory of worker `index`: `root/<index>`
    pub fn worker_dir(&self, index: usize) -> PathBuf {
        self.root.join(index.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        let mut argv = vec!["disktroyer"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = StressConfig::from_args(parse(&[])).unwrap();
        assert_eq!(config.root, PathBuf::from("disktroyer"));
        assert_eq!(config.max_dirs, 16);
        assert_eq!(config.max_file_size, 65536);
        assert_eq!(config.max_files, 100);
        assert!(!config.verbose);
        assert!(config.show_progress);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_legacy_flag_names() {
        let args = parse(&["--maxdirs", "2", "--maxfiles", "3", "--maxfilesize", "10"]);
        let config = StressConfig::from_args(args).unwrap();
        assert_eq!(config.max_dirs, 2);
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_file_size, 10);
    }

    #[test]
    fn test_failure_policy_flag() {
        let args = parse(&["--on-worker-error", "abort", "-q", "-v"]);
        let config = StressConfig::from_args(args).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(!config.show_progress);
        assert!(config.verbose);

        let config = StressConfig::from_args(parse(&["--on-worker-error", "fail"])).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Fail);
    }

    #[test]
    fn test_failure_policy_semantics() {
        assert!(!FailurePolicy::Continue.stops_siblings());
        assert!(!FailurePolicy::Continue.fails_process());

        assert!(!FailurePolicy::Fail.stops_siblings());
        assert!(FailurePolicy::Fail.fails_process());

        assert!(FailurePolicy::Abort.stops_siblings());
        assert!(FailurePolicy::Abort.fails_process());
    }

    #[test]
    fn test_rejects_zero_values() {
        assert!(matches!(
            StressConfig::from_args(parse(&["-d", "0"])),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));
        assert!(matches!(
            StressConfig::from_args(parse(&["-f", "0"])),
            Err(ConfigError::InvalidFileCount { count: 0, .. })
        ));
        assert!(matches!(
            StressConfig::from_args(parse(&["-s", "0"])),
            Err(ConfigError::InvalidFileSize { size: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_root() {
        let config = StressConfig {
            root: PathBuf::new(),
            ..StressConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRoot)));
    }

    #[test]
    fn test_worker_dir() {
        let config = StressConfig {
            root: PathBuf::from("/tmp/t"),
            ..StressConfig::default()
        };
        assert_eq!(config.worker_dir(0), PathBuf::from("/tmp/t/0"));
        assert_eq!(config.worker_dir(15), PathBuf::from("/tmp/t/15"));
    }
}
