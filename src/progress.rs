//! Progress reporting for upload runs
//!
//! Provides a per-file progress bar using indicatif, plus the header and
//! summary printed around a run.

use crate::upload::UploadSummary;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar advanced once per uploaded file
#[derive(Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a reporter for `total` files
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Hidden reporter for quiet mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Record one uploaded file
    pub fn increment(&self, name: &str) {
        self.bar.set_message(name.to_string());
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop the bar where it is (run aborted)
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
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

/// Headline for the run summary
fn summary_title(bucket: &str, dest: &str, dry_run: bool) -> String {
    if dry_run {
        format!("Dry run complete, nothing uploaded to {}/{}", bucket, dest)
    } else {
        format!("Completed uploading to {}/{}", bucket, dest)
    }
}

/// Print a summary of a completed run
pub fn print_summary(summary: &UploadSummary, bucket: &str, dest: &str, dry_run: bool) {
    println!();
    println!(
        "{}",
        style(summary_title(bucket, dest, dry_run)).green().bold()
    );
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(summary.files as u64)
    );
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(summary.bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        summary.duration.as_secs_f64(),
        summary.files_per_second()
    );
    println!();
}

/// Print a header at the start of the run
pub fn print_header(source: &str, target: &str, files: usize, concurrency: usize) {
    println!();
    println!(
        "{} {}",
        style("s3-backup").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Target:").bold(), target);
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(files as u64)
    );
    println!("  {} {}", style("Concurrency:").bold(), concurrency);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_summary_title() {
        assert_eq!(
            summary_title("backup", "new", false),
            "Completed uploading to backup/new"
        );
        let dry = summary_title("backup", "new", true);
        assert!(dry.contains("nothing uploaded"));
        assert!(!dry.starts_with("Completed uploading"));
    }

    #[test]
    fn test_hidden_reporter_counts() {
        let reporter = ProgressReporter::hidden();
        reporter.increment("a.txt");
        reporter.increment("b.txt");
        assert_eq!(reporter.position(), 2);
    }
}
