//! s3-backup - Copy a directory tree into an S3 bucket
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use s3_backup::config::{CliArgs, UploadConfig};
use s3_backup::progress::{print_header, print_summary, ProgressReporter};
use s3_backup::store::{MemoryStore, ObjectStore, S3Store};
use s3_backup::upload::UploadCoordinator;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
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

    // Setup logging
    setup_logging(args.debug)?;

    // Validate and create config
    let config = UploadConfig::from_args(args).context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run_upload(config))
}

async fn run_upload(config: UploadConfig) -> Result<()> {
    let store: Arc<dyn ObjectStore> = match &config.s3 {
        Some(settings) => Arc::new(S3Store::connect(settings).await),
        None => {
            info!("Dry run: nothing is sent, only object metadata is recorded");
            Arc::new(MemoryStore::new().metadata_only())
        }
    };

    let coordinator = UploadCoordinator::from_config(&config, Arc::clone(&store));

    // Ctrl-C aborts the run through the same path as an upload failure
    let cancel = coordinator.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, aborting upload...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    let target = format!("{}/{}", store.describe(), config.destination);

    if config.show_progress {
        print_header(
            &config.source_root.display().to_string(),
            &target,
            coordinator.file_count(),
            config.concurrency,
        );
    }

    let progress = if config.show_progress {
        ProgressReporter::new(coordinator.file_count())
    } else {
        ProgressReporter::hidden()
    };

    let reporter = progress.clone();
    let result = coordinator
        .run(move |name| reporter.increment(name))
        .await;

    match result {
        Ok(summary) => {
            progress.finish("done");
            if config.show_progress {
                print_summary(
                    &summary,
                    &config.bucket,
                    &config.destination,
                    config.is_dry_run(),
                );
            }
            info!(
                files = summary.files,
                bytes = summary.bytes,
                target = %target,
                "Backup complete"
            );
            Ok(())
        }
        Err(e) => {
            progress.abandon("aborted");
            Err(e).with_context(|| {
                format!(
                    "Upload to {} aborted after {} file(s)",
                    target,
                    progress.position()
                )
            })
        }
    }
}

fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("s3_backup=debug,warn")
    } else {
        EnvFilter::new("s3_backup=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
