//! Sliding admission window
//!
//! Each completed upload is a credit that authorizes exactly one new
//! admission, so the number of admitted-but-unfinished files never exceeds
//! the limit. The window is plain state: the manager task owns it and is the
//! only writer, which is why no lock guards it.

/// Admission state over an [`UploadJob`](super::UploadJob)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Files in the job
    len: usize,

    /// Effective concurrency limit, already clamped to `len`
    limit: usize,

    /// Index of the next file to admit
    next_index: usize,

    /// Admitted files without an outcome yet
    active: usize,

    /// Files that finished successfully
    completed: usize,

    /// Set on abort; nothing is admitted afterwards
    closed: bool,
}

impl Window {
    /// Create a window over `len` files with at most `limit` in flight
    ///
    /// A limit of zero is treated as one; a limit above `len` is clamped.
    pub fn new(len: usize, limit: usize) -> Self {
        Self {
            len,
            limit: limit.max(1).min(len),
            next_index: 0,
            active: 0,
            completed: 0,
            closed: false,
        }
    }

    /// Admit the initial `min(limit, len)` files, returning their indices
    pub fn seed(&mut self) -> Vec<usize> {
        std::iter::from_fn(|| self.admit()).collect()
    }

    /// Admit the next file if a slot and an unstarted file are available
    pub fn admit(&mut self) -> Option<usize> {
        if self.closed || self.active >= self.limit || self.next_index >= self.len {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        self.active += 1;
        Some(index)
    }

    /// Record a successful completion and spend its credit on the next file
    pub fn complete(&mut self) -> Option<usize> {
        self.active = self.active.saturating_sub(1);
        self.completed += 1;
        self.admit()
    }

    /// Record a failure; the slot is not refilled and the window closes
    pub fn abort(&mut self) {
        self.active = self.active.saturating_sub(1);
        self.close();
    }

    /// Stop admitting without recording an outcome (external cancellation)
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Files not yet admitted
    pub fn pending(&self) -> usize {
        self.len - self.next_index
    }

    /// Every file finished successfully
    pub fn is_finished(&self) -> bool {
        self.completed == self.len
    }
}
