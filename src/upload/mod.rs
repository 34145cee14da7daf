//! Bounded-concurrency upload engine
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │      Window manager      │
//!                  │  - owns Window cursor    │
//!                  │  - CompletionTracker     │
//!                  │  - progress callback     │
//!                  └─────┬──────────────▲─────┘
//!          admit(path)   │              │  Done / Failed
//!                        ▼              │
//!                  ┌───────────┐        │
//!                  │ Dispatcher│        │
//!                  └─────┬─────┘        │
//!       ┌────────────────┼──────────────┼───┐
//! ┌─────▼─────┐    ┌─────▼─────┐    ┌───┴───▼───┐
//! │  Worker   │    │  Worker   │    │  Worker   │   at most N at once
//! │ read+put  │    │ read+put  │    │ read+put  │
//! └───────────┘    └───────────┘    └───────────┘
//! ```
//!
//! The manager seeds `min(N, files)` admissions, then spends one credit per
//! completed upload on the next file. The first failure cancels the run.

pub mod engine;
pub mod job;
pub mod tracker;
pub mod window;
pub mod worker;

pub use engine::{UploadCoordinator, UploadSummary};
pub use job::UploadJob;
pub use tracker::{CompletionTracker, CompletionWait, RunOutcome, RunState};
pub use window::Window;
pub use worker::{UploadedFile, WorkerContext, WorkerEvent, WorkerGauge};
