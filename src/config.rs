//! Configuration types for s3-backup
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Destination prefix composition (commit and timestamp stamps)

use crate::error::ConfigError;
use crate::store::S3Settings;
use clap::Parser;
use std::path::PathBuf;

/// Default number of uploads in flight
pub const DEFAULT_CONCURRENCY: usize = 25;

/// Maximum reasonable concurrency
pub const MAX_CONCURRENCY: usize = 512;

/// Commit baked in at build time, used by `--commitstamp`
pub const BUILD_COMMIT: Option<&str> = option_env!("S3_BACKUP_COMMIT");

/// Copy a directory tree into an S3 bucket
#[derive(Parser, Debug, Clone)]
#[command(
    name = "s3-backup",
    version,
    about = "Copy a directory tree into an S3 bucket",
    long_about = "Uploads every file under a source directory to an S3 bucket, under a\n\
                  destination prefix. A fixed number of uploads run at once; the first\n\
                  failed upload aborts the run.",
    after_help = "EXAMPLES:\n    \
        s3-backup --src ./public --bucket my-site --dest release\n    \
        s3-backup --src ./public --bucket my-site --dest release --timestamp --commitstamp\n    \
        s3-backup --src ./data --bucket backups --endpoint http://127.0.0.1:9000 -c 8\n    \
        s3-backup --src ./data --dest nightly --dry-run"
)]
pub struct CliArgs {
    /// Source directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Bucket to upload into
    #[arg(long, default_value = "backup", value_name = "NAME")]
    pub bucket: String,

    /// AWS region
    #[arg(long, default_value = "us-east-2", value_name = "REGION")]
    pub region: String,

    /// Access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, value_name = "KEY")]
    pub key: Option<String>,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, value_name = "SECRET")]
    pub secret: Option<String>,

    /// Custom endpoint for S3-compatible stores
    #[arg(long, env = "AWS_ENDPOINT_URL", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Destination path of the root directory inside the bucket
    #[arg(long, default_value = "new", value_name = "PREFIX")]
    pub dest: String,

    /// Append the build commit to the destination
    #[arg(long)]
    pub commitstamp: bool,

    /// Append the current Unix timestamp to the destination
    #[arg(long)]
    pub timestamp: bool,

    /// Number of uploads in flight at once
    #[arg(
        short = 'c',
        long,
        default_value_t = DEFAULT_CONCURRENCY,
        value_name = "NUM"
    )]
    pub concurrency: usize,

    /// Upload to an in-memory store and report what would be sent
    #[arg(long)]
    pub dry_run: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Canonical source root
    pub source_root: PathBuf,

    /// Destination prefix inside the bucket
    pub destination: String,

    /// Uploads in flight at once
    pub concurrency: usize,

    /// Debug logging (verbosity only)
    pub debug: bool,

    /// Show progress bar and summary
    pub show_progress: bool,

    /// S3 connection settings; `None` for a dry run
    pub s3: Option<S3Settings>,

    /// Bucket name, also used for display in dry runs
    pub bucket: String,
}

impl UploadConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.concurrency == 0 || args.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency {
                count: args.concurrency,
                max: MAX_CONCURRENCY,
            });
        }

        if args.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }

        let src = match args.src {
            Some(src) => src,
            None => std::env::current_dir().map_err(|e| ConfigError::InvalidSource {
                path: PathBuf::from("."),
                reason: e.to_string(),
            })?,
        };

        let source_root = src
            .canonicalize()
            .map_err(|e| ConfigError::InvalidSource {
                path: src.clone(),
                reason: e.to_string(),
            })?;

        if !source_root.is_dir() {
            return Err(ConfigError::InvalidSource {
                path: src,
                reason: "not a directory".to_string(),
            });
        }

        let timestamp = args.timestamp.then(|| chrono::Utc::now().timestamp());
        let commit = if args.commitstamp { BUILD_COMMIT } else { None };
        let destination = build_destination(&args.dest, commit, timestamp)?;

        let s3 = if args.dry_run {
            None
        } else {
            Some(S3Settings {
                bucket: args.bucket.clone(),
                region: args.region,
                access_key: non_empty(args.key)
                    .ok_or(ConfigError::MissingCredentials("no access key id given"))?,
                secret_key: non_empty(args.secret)
                    .ok_or(ConfigError::MissingCredentials("no secret access key given"))?,
                endpoint: non_empty(args.endpoint),
            })
        };

        Ok(Self {
            source_root,
            destination,
            concurrency: args.concurrency,
            debug: args.debug,
            show_progress: !args.quiet,
            s3,
            bucket: args.bucket,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.s3.is_none()
    }
}

/// Compose the destination prefix: `dest[.commit][.timestamp]`
///
/// Leading and trailing slashes are dropped from `dest`.
pub fn build_destination(
    dest: &str,
    commit: Option<&str>,
    timestamp: Option<i64>,
) -> Result<String, ConfigError> {
    let base = dest.trim().trim_matches('/');
    if base.is_empty() {
        return Err(ConfigError::InvalidDestination {
            dest: dest.to_string(),
            reason: "destination must not be empty".to_string(),
        });
    }

    let mut parts = vec![base.to_string()];
    if let Some(commit) = commit.filter(|c| !c.is_empty()) {
        parts.push(commit.to_string());
    }
    if let Some(ts) = timestamp {
        parts.push(ts.to_string());
    }

    Ok(parts.join("."))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
