//! s3-backup - Copy a directory tree into an S3 bucket
//!
//! Uploads every file under a source directory to an object store under a
//! destination prefix, keeping a fixed number of uploads in flight and
//! aborting on the first failure.
//!
//! # Features
//!
//! - **Sliding upload window**: at most `N` uploads run at once; each
//!   completed upload immediately admits the next file.
//!
//! - **Fail fast**: the first read or put failure ends the run and cancels
//!   uploads that have not started yet.
//!
//! - **Content types**: well-known web asset extensions map to fixed types,
//!   everything else is sniffed from the file's leading bytes.
//!
//! - **Pluggable store**: the engine talks to an [`ObjectStore`] trait;
//!   S3 (or any S3-compatible endpoint) and an in-memory store are provided.
//!
//! # Architecture
//!
//! ```text
//!   FileCatalog ──► UploadJob ──► Window manager ──► Dispatcher ──► Workers
//!                                      ▲                              │
//!                                      └──── Done / Failed ───────────┘
//!                                                                     │
//!                                                                     ▼
//!                                                               ObjectStore
//! ```
//!
//! # Example
//!
//! ```bash
//! # Upload ./public to s3://my-site/release.<unix time>/
//! s3-backup --src ./public --bucket my-site --dest release --timestamp
//!
//! # Eight uploads at a time against MinIO
//! s3-backup --src ./data --bucket backups --endpoint http://127.0.0.1:9000 -c 8
//! ```

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod progress;
pub mod store;
pub mod upload;

pub use catalog::FileCatalog;
pub use config::{CliArgs, UploadConfig};
pub use error::{ConfigError, Result, StoreError, UploadError};
pub use store::{MemoryStore, ObjectStore, PutAck, S3Store};
pub use upload::{UploadCoordinator, UploadJob, UploadSummary};
