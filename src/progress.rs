//! Progress reporting for the stress run
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::config::StressConfig;
use crate::stress::{CoordinatorState, StressProgress, StressResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays run status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &StressProgress) {
        self.bar.set_message(format_progress(progress));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_progress(progress: &StressProgress) -> String {
    let prefix = match progress.state {
        CoordinatorState::Draining => "Draining | ",
        _ => "",
    };

    let mut msg = format!(
        "{}Cycles: {} | Files: {} | Written: {} | Rate: {:.0} files/s | Workers: {}/{}",
        prefix,
        format_number(progress.totals.cycles),
        format_number(progress.totals.files_created),
        format_size(progress.totals.bytes_written, BINARY),
        progress.files_per_second(),
        progress.active_workers,
        progress.total_workers,
    );

    if progress.failed_workers > 0 {
        msg.push_str(&format!(" | Failed: {}", progress.failed_workers));
    }

    msg
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the run
pub fn print_header(config: &StressConfig) {
    println!();
    println!(
        "{} {}",
        style("disktroyer").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), config.root.display());
    println!("  {} {}", style("Directories:").bold(), config.max_dirs);
    println!("  {} {}", style("Files/cycle:").bold(), config.max_files);
    println!(
        "  {} {}",
        style("Max file size:").bold(),
        format_size(config.max_file_size as u64, BINARY)
    );
    println!("  {} {}", style("CPUs:").bold(), num_cpus::get());
    println!("  {}", style("press ctrl-C to exit").dim());
    println!();
}

/// Print a summary of the run
pub fn print_summary(result: &StressResult) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.totals.files_created as f64 / duration_secs
    } else {
        0.0
    };

    let title = if result.is_success() {
        style("Run Complete").green().bold()
    } else {
        style("Run Finished With Failures").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Started:").bold(),
        result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  {} {}", style("Workers:").bold(), result.workers);
    println!(
        "  {} {}",
        style("Cycles:").bold(),
        format_number(result.totals.cycles)
    );
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.totals.files_created)
    );
    println!(
        "  {} {}",
        style("Written:").bold(),
        format_size(result.totals.bytes_written, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if !result.failures.is_empty() {
        println!(
            "  {} {}",
            style("Failed workers:").yellow().bold(),
            result.failures.len()
        );
        for failure in &result.failures {
            println!("    {}", style(failure).yellow());
        }
    }
    println!();
}
