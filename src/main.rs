//! disktroyer - Filesystem Churn Generator
//!
//! Entry point for the CLI application.

use anyhow::{bail, Context, Result};
use clap::Parser;
use disktroyer::config::{CliArgs, StressConfig};
use disktroyer::progress::{print_header, print_summary, ProgressReporter};
use disktroyer::stress::StressCoordinator;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Validate and create config
    let config = StressConfig::from_args(args).context("Invalid configuration")?;

    // Setup logging
    setup_logging(config.verbose);

    let show_progress = config.show_progress;

    if show_progress {
        print_header(&config);
    }

    // Root directory and payload; nothing runs if either fails
    let coordinator = StressCoordinator::new(config).context("Failed to initialize")?;

    // Setup signal handler for graceful shutdown
    let stop = coordinator.stop_handle();
    ctrlc::set_handler(move || {
        if stop.request_stop() {
            eprintln!("\nInterrupt received, finishing current cycles...");
        }
    })
    .context("Failed to set signal handler")?;

    #[cfg(feature = "debug-server")]
    {
        if let Some(addr) = coordinator.config().debug_addr.clone() {
            disktroyer::server::spawn_background(addr, coordinator.monitor())
                .context("Failed to start debug server")?;
        }
    }

    info!("press ctrl-C to exit");

    let progress = show_progress.then(ProgressReporter::new);
    if let Some(ref p) = progress {
        p.set_status("Starting workers...");
    }

    let result = coordinator
        .run_with_monitor(|monitor| {
            if let Some(ref p) = progress {
                p.update(&monitor.progress());
            }
        })
        .context("Stress run failed")?;

    if let Some(ref p) = progress {
        if result.is_success() {
            p.finish("Run completed");
        } else {
            p.finish("Run finished with worker failures");
        }
        print_summary(&result);
    }

    if !result.exit_success() {
        bail!("{} worker(s) failed", result.failures.len());
    }
    if !result.is_success() {
        warn!(
            failures = result.failures.len(),
            "Worker failures ignored by --on-worker-error continue"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("disktroyer=debug,warn")
    } else {
        EnvFilter::new("disktroyer=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
