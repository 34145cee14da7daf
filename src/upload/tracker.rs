//! Run completion tracking
//!
//! The tracker counts down expected completions and produces the run's single
//! terminal outcome over a oneshot channel: either every file uploaded, or the
//! first fatal error. Later outcomes are ignored once a terminal state is set.

use crate::error::UploadError;
use tokio::sync::oneshot;
use tracing::debug;

/// Per-run state machine: `Running -> {AllCompleted | Aborted}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    AllCompleted,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// Terminal outcome delivered to the waiting caller
#[derive(Debug)]
pub enum RunOutcome {
    /// Every file reported done
    AllCompleted { files: usize, bytes: u64 },

    /// The first fatal error; some subset of files may have been uploaded
    Aborted {
        error: UploadError,
        uploaded: usize,
    },
}

/// Counts completions and fires the terminal outcome exactly once
#[derive(Debug)]
pub struct CompletionTracker {
    expected: usize,
    completed: usize,
    bytes: u64,
    state: RunState,
    finish: Option<oneshot::Sender<RunOutcome>>,
}

impl CompletionTracker {
    /// Create a tracker expecting `expected` completions
    ///
    /// With nothing to wait for the tracker starts out completed.
    pub fn new(expected: usize) -> (Self, CompletionWait) {
        let (tx, rx) = oneshot::channel();
        let mut tracker = Self {
            expected,
            completed: 0,
            bytes: 0,
            state: RunState::Running,
            finish: Some(tx),
        };

        if expected == 0 {
            tracker.settle(RunState::AllCompleted, None);
        }

        (tracker, CompletionWait { rx })
    }

    /// Record one successful upload of `bytes`
    pub fn record_done(&mut self, bytes: u64) -> RunState {
        if self.state != RunState::Running {
            return self.state;
        }

        self.completed += 1;
        self.bytes += bytes;

        if self.completed >= self.expected {
            self.settle(RunState::AllCompleted, None);
        }
        self.state
    }

    /// Abort the run; returns false if it had already reached a terminal state
    pub fn abort(&mut self, error: UploadError) -> bool {
        if self.state != RunState::Running {
            debug!(error = %error, state = ?self.state, "Ignoring error after run ended");
            return false;
        }

        self.settle(RunState::Aborted, Some(error));
        true
    }

    fn settle(&mut self, state: RunState, error: Option<UploadError>) {
        self.state = state;

        let outcome = match error {
            Some(error) => RunOutcome::Aborted {
                error,
                uploaded: self.completed,
            },
            None => RunOutcome::AllCompleted {
                files: self.completed,
                bytes: self.bytes,
            },
        };

        if let Some(tx) = self.finish.take() {
            // The waiter may have gone away; the state is still final.
            let _ = tx.send(outcome);
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn remaining(&self) -> usize {
        self.expected.saturating_sub(self.completed)
    }
}

/// Caller side of the tracker
#[derive(Debug)]
pub struct CompletionWait {
    rx: oneshot::Receiver<RunOutcome>,
}

impl CompletionWait {
    /// Block until the run reaches a terminal state
    ///
    /// If the tracker is dropped without settling, the run is reported as
    /// aborted rather than waiting forever.
    pub async fn wait(self) -> RunOutcome {
        self.rx.await.unwrap_or(RunOutcome::Aborted {
            error: UploadError::ChannelClosed,
            uploaded: 0,
        })
    }
}
