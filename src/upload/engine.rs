//! Upload coordinator - orchestrates a bounded-concurrency upload run
//!
//! The coordinator is responsible for:
//! - Seeding the window with the first `N` files
//! - Running the dispatcher (admitted path -> spawned worker)
//! - Running the window manager (worker outcome -> progress, tracker, refill)
//! - Failing fast on the first error and returning the terminal outcome
//!
//! All coordination happens over channels. The window cursor lives inside the
//! manager task, which is also the only consumer of worker outcomes.

use super::job::UploadJob;
use super::tracker::{CompletionTracker, RunOutcome, RunState};
use super::window::Window;
use super::worker::{run_worker, WorkerContext, WorkerEvent, WorkerGauge};
use crate::catalog::FileCatalog;
use crate::config::UploadConfig;
use crate::error::{Result, UploadError};
use crate::store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of a run in which every file was uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// Files uploaded
    pub files: usize,

    /// Bytes uploaded
    pub bytes: u64,

    /// Wall time of the run
    pub duration: Duration,

    /// Most workers alive at once, from dispatch until their outcome
    pub peak_workers: usize,
}

impl UploadSummary {
    pub fn files_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.files as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates one upload run
pub struct UploadCoordinator {
    job: Arc<UploadJob>,
    concurrency: usize,
    store: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
}

impl UploadCoordinator {
    pub fn new(job: UploadJob, concurrency: usize, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            job: Arc::new(job),
            concurrency,
            store,
            cancel: CancellationToken::new(),
        }
    }

    /// Catalog the configured source root and prepare a run
    pub fn from_config(config: &UploadConfig, store: Arc<dyn ObjectStore>) -> Self {
        let catalog = FileCatalog::new(&config.source_root);
        let job = UploadJob::from_catalog(&catalog, &config.destination);
        Self::new(job, config.concurrency, store)
    }

    /// Token that aborts the run when cancelled (for signal handlers)
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn file_count(&self) -> usize {
        self.job.len()
    }

    pub fn job(&self) -> &UploadJob {
        &self.job
    }

    /// Run the upload to completion or first failure
    ///
    /// `on_progress` is called once per uploaded file with its name relative
    /// to the source root. On failure, uploads already in flight are not
    /// awaited; they finish or fail in the background.
    pub async fn run<F>(self, on_progress: F) -> Result<UploadSummary>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let start = Instant::now();
        let window = Window::new(self.job.len(), self.concurrency);

        info!(
            files = self.job.len(),
            concurrency = window.limit(),
            store = %self.store.describe(),
            prefix = %self.job.prefix(),
            "Starting upload run"
        );

        let (tracker, wait) = CompletionTracker::new(self.job.len());
        let gauge = WorkerGauge::default();

        if tracker.state() != RunState::Running {
            debug!("Nothing to upload");
        } else {
            let capacity = window.limit().max(1);
            let (admit_tx, admit_rx) = mpsc::channel::<PathBuf>(capacity);
            let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>(capacity);

            let ctx = WorkerContext {
                job: Arc::clone(&self.job),
                store: Arc::clone(&self.store),
                cancel: self.cancel.clone(),
            };

            tokio::spawn(dispatch(admit_rx, ctx, event_tx, gauge.clone()));

            tokio::spawn(manage_window(
                window,
                tracker,
                Arc::clone(&self.job),
                admit_tx,
                event_rx,
                self.cancel.clone(),
                on_progress,
            ));
        }

        match wait.wait().await {
            RunOutcome::AllCompleted { files, bytes } => {
                let summary = UploadSummary {
                    files,
                    bytes,
                    duration: start.elapsed(),
                    peak_workers: gauge.peak(),
                };
                info!(
                    files = summary.files,
                    bytes = summary.bytes,
                    duration_secs = summary.duration.as_secs_f64(),
                    "Upload run completed"
                );
                Ok(summary)
            }
            RunOutcome::Aborted { error, uploaded } => {
                error!(
                    error = %error,
                    uploaded = uploaded,
                    total = self.job.len(),
                    "Upload run aborted"
                );
                Err(error)
            }
        }
    }
}

/// Dispatcher: start one worker per admitted path without waiting on it
///
/// Stops as soon as the run is cancelled, even if admissions are queued.
async fn dispatch(
    mut admit_rx: mpsc::Receiver<PathBuf>,
    ctx: WorkerContext,
    events: mpsc::Sender<WorkerEvent>,
    gauge: WorkerGauge,
) {
    loop {
        let path = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!("Dispatcher stopping: run cancelled");
                break;
            }
            path = admit_rx.recv() => match path {
                Some(path) => path,
                None => break,
            },
        };

        debug!(path = %path.display(), "Dispatching upload");
        tokio::spawn(run_worker(
            path,
            ctx.clone(),
            events.clone(),
            gauge.enter(),
        ));
    }
}

/// Window manager: single owner of the window and the completion tracker
///
/// Returns the window in its final state.
async fn manage_window<F>(
    mut window: Window,
    mut tracker: CompletionTracker,
    job: Arc<UploadJob>,
    admit_tx: mpsc::Sender<PathBuf>,
    mut events: mpsc::Receiver<WorkerEvent>,
    cancel: CancellationToken,
    mut on_progress: F,
) -> Window
where
    F: FnMut(&str) + Send + 'static,
{
    for index in window.seed() {
        if !admit(&admit_tx, &job, index).await {
            window.close();
            tracker.abort(closed_error(&cancel));
            return window;
        }
    }

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                window.close();
                tracker.abort(UploadError::Cancelled);
                break;
            }
            event = events.recv() => event,
        };

        match event {
            Some(WorkerEvent::Done(file)) => {
                debug!(
                    name = %file.name,
                    active = window.active(),
                    completed = window.completed() + 1,
                    "Received done"
                );

                on_progress(&file.name);

                if tracker.record_done(file.bytes) == RunState::AllCompleted {
                    window.complete();
                    break;
                }

                if let Some(index) = window.complete() {
                    if !admit(&admit_tx, &job, index).await {
                        tracker.abort(closed_error(&cancel));
                        break;
                    }
                }
            }
            Some(WorkerEvent::Failed(error)) => {
                warn!(error = %error, "Upload failed, aborting run");
                window.abort();
                cancel.cancel();
                tracker.abort(error);
                break;
            }
            None => {
                tracker.abort(UploadError::ChannelClosed);
                break;
            }
        }
    }

    debug!(
        admitted = window.next_index(),
        active = window.active(),
        completed = window.completed(),
        state = ?tracker.state(),
        "Window manager finished"
    );

    window
}

/// The dispatcher hangs up on cancellation; anything else is unexpected
fn closed_error(cancel: &CancellationToken) -> UploadError {
    if cancel.is_cancelled() {
        UploadError::Cancelled
    } else {
        UploadError::ChannelClosed
    }
}

async fn admit(admit_tx: &mpsc::Sender<PathBuf>, job: &UploadJob, index: usize) -> bool {
    match job.get(index) {
        Some(path) => admit_tx.send(path.to_path_buf()).await.is_ok(),
        None => false,
    }
}
