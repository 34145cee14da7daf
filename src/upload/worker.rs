//! Per-file upload worker
//!
//! A worker reads one file, resolves its content type, puts it to the object
//! store and reports exactly one outcome back to the window manager. A worker
//! that finds the run already cancelled exits without reporting. Workers own
//! their payload buffer and never talk to each other.

use super::job::UploadJob;
use crate::content::resolve_content_type;
use crate::error::{Result, UploadError};
use crate::store::ObjectStore;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A file that made it into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Path relative to the source root
    pub name: String,

    /// Destination key
    pub key: String,

    /// Payload length
    pub bytes: u64,

    /// Content type sent with the put
    pub content_type: String,

    /// Entity tag reported by the store
    pub e_tag: Option<String>,
}

/// Outcome reported by a worker; exactly one per admitted file
#[derive(Debug)]
pub enum WorkerEvent {
    /// Put succeeded
    Done(UploadedFile),

    /// Read or put failed; fatal to the run
    Failed(UploadError),
}

/// Shared, read-only state every worker needs
#[derive(Clone)]
pub struct WorkerContext {
    pub job: Arc<UploadJob>,
    pub store: Arc<dyn ObjectStore>,
    pub cancel: CancellationToken,
}

/// Counts workers from dispatch until their outcome is known
#[derive(Debug, Clone, Default)]
pub struct WorkerGauge {
    counts: Arc<GaugeCounts>,
}

#[derive(Debug, Default)]
struct GaugeCounts {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl WorkerGauge {
    /// Occupy a slot until the returned guard is dropped
    pub fn enter(&self) -> WorkerSlot {
        let now = self.counts.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.counts.peak.fetch_max(now, Ordering::SeqCst);
        WorkerSlot {
            counts: Arc::clone(&self.counts),
        }
    }

    pub fn current(&self) -> usize {
        self.counts.current.load(Ordering::SeqCst)
    }

    /// Highest number of workers alive at once
    pub fn peak(&self) -> usize {
        self.counts.peak.load(Ordering::SeqCst)
    }
}

/// A worker's place in a [`WorkerGauge`]
#[derive(Debug)]
pub struct WorkerSlot {
    counts: Arc<GaugeCounts>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.counts.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Upload a single file
///
/// Returns `Ok(None)` when the run was cancelled before the read or before
/// the put; in that case nothing is sent to the store.
pub async fn upload_file(path: &Path, ctx: &WorkerContext) -> Result<Option<UploadedFile>> {
    if ctx.cancel.is_cancelled() {
        return Ok(None);
    }

    let read_error = |source: io::Error| UploadError::SourceRead {
        path: path.to_path_buf(),
        source,
    };

    // Reading a FIFO or device could block forever
    let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
    if !metadata.is_file() {
        return Err(read_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let payload = tokio::fs::read(path).await.map_err(read_error)?;

    let content_type = resolve_content_type(path, &payload);
    let key = ctx.job.destination_key(path);
    let name = ctx.job.relative_name(path);
    let bytes = payload.len() as u64;

    debug!(key = %key, content_type = %content_type, bytes = bytes, "Evaluating file");

    if ctx.cancel.is_cancelled() {
        return Ok(None);
    }

    let ack = ctx.store.put(&key, payload, &content_type, bytes).await?;

    Ok(Some(UploadedFile {
        name,
        key,
        bytes,
        content_type,
        e_tag: ack.e_tag,
    }))
}

/// Run one upload and report its outcome on `events`
///
/// The upload itself runs in its own task so a panic still yields a
/// `Failed` event instead of a missing outcome. `slot` is released once the
/// outcome is known, before it is reported, so the next admission never
/// overlaps this worker.
pub async fn run_worker(
    path: PathBuf,
    ctx: WorkerContext,
    events: mpsc::Sender<WorkerEvent>,
    slot: WorkerSlot,
) {
    let task_path = path.clone();
    let task = tokio::spawn(async move { upload_file(&task_path, &ctx).await });

    let outcome = task.await;
    drop(slot);

    let event = match outcome {
        Ok(Ok(Some(file))) => WorkerEvent::Done(file),
        Ok(Ok(None)) => {
            debug!(path = %path.display(), "Upload skipped after cancellation");
            return;
        }
        Ok(Err(e)) => WorkerEvent::Failed(e),
        Err(join_err) => WorkerEvent::Failed(UploadError::WorkerPanicked {
            path,
            message: join_err.to_string(),
        }),
    };

    if events.send(event).await.is_err() {
        debug!("Run already finished, dropping worker outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::fs;
    use tempfile::tempdir;

    fn context(root: &Path, store: Arc<MemoryStore>) -> WorkerContext {
        WorkerContext {
            job: Arc::new(UploadJob::new(root, "new", Vec::new())),
            store,
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_uploads_with_key_and_type() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();
        let path = dir.path().join("static/app.js");
        fs::write(&path, b"console.log('hi');").unwrap();

        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), Arc::clone(&store));

        let uploaded = upload_file(&path, &ctx).await.unwrap().unwrap();
        assert_eq!(uploaded.name, "static/app.js");
        assert_eq!(uploaded.key, "new/static/app.js");
        assert_eq!(uploaded.bytes, 18);

        let obj = store.get("new/static/app.js").unwrap();
        assert_eq!(obj.content_type, "application/javascript");
        assert_eq!(obj.length, 18);
        assert_eq!(obj.body, b"console.log('hi');");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_uploaded() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), Arc::clone(&store));

        let err = upload_file(&dir.path().join("gone.txt"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::SourceRead { .. }));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"a").unwrap();

        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), Arc::clone(&store));
        ctx.cancel.cancel();

        assert!(upload_file(&path, &ctx).await.unwrap().is_none());
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_run_worker_reports_store_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        fs::write(&path, [0u8; 16]).unwrap();

        let store = Arc::new(MemoryStore::new().fail_on("new/bad.bin"));
        let ctx = context(dir.path(), store);
        let (tx, mut rx) = mpsc::channel(1);

        run_worker(path, ctx, tx, WorkerGauge::default().enter()).await;

        match rx.recv().await {
            Some(WorkerEvent::Failed(UploadError::Store(e))) => assert_eq!(e.key, "new/bad.bin"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_worker_reports_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"a").unwrap();

        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), Arc::clone(&store));
        ctx.cancel.cancel();

        let gauge = WorkerGauge::default();
        let (tx, mut rx) = mpsc::channel(1);
        run_worker(path, ctx, tx, gauge.enter()).await;

        assert!(rx.recv().await.is_none());
        assert_eq!(gauge.current(), 0);
        assert_eq!(gauge.peak(), 1);
        assert_eq!(store.attempts(), 0);
    }

    #[test]
    fn test_gauge_tracks_peak() {
        let gauge = WorkerGauge::default();
        let first = gauge.enter();
        let second = gauge.enter();
        assert_eq!(gauge.current(), 2);

        drop(first);
        let third = gauge.enter();
        assert_eq!(gauge.current(), 2);
        assert_eq!(gauge.peak(), 2);

        drop(second);
        drop(third);
        assert_eq!(gauge.current(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_special_file_is_not_read() {
        use std::os::unix::net::UnixListener;

        let dir = tempdir().unwrap();
        let path = dir.path().join("sock");
        let _listener = UnixListener::bind(&path).unwrap();

        let store = Arc::new(MemoryStore::new());
        let ctx = context(dir.path(), Arc::clone(&store));

        let err = upload_file(&path, &ctx).await.unwrap_err();
        match err {
            UploadError::SourceRead { path: failed, source } => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.attempts(), 0);
    }
}
