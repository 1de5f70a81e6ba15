//! Asynchronous PNG writer pool.
//!
//! A fixed set of worker threads drains a job channel; an independent
//! counting semaphore bounds how many writes are simultaneously in flight,
//! decoupling thread count from I/O concurrency. Workers block on the permit
//! or on I/O — the render thread never does.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use tokio::sync::Semaphore;

use crate::error::ExportError;
use crate::export::tracker::ProgressTracker;
use crate::object::ObjectId;
use crate::readback::PixelImage;

/// One queued write: a captured frame plus where it goes.
#[derive(Debug)]
pub struct WriteJob {
    pub object: ObjectId,
    pub image: PixelImage,
    pub path: PathBuf,
}

enum Msg {
    Job(Box<WriteJob>),
    Stop,
}

/// Cloneable dispatch handle, safe to move into capture callbacks.
#[derive(Clone)]
pub struct WriterHandle {
    tx: Sender<Msg>,
    closed: Arc<RwLock<bool>>,
}

impl WriterHandle {
    /// Queues one write without blocking.
    ///
    /// Returns the job back if the pool has shut down, so the caller can
    /// finalize the object itself. An accepted job is always processed: the
    /// send happens under the same lock `shutdown` takes to close the
    /// intake, so it is ordered before the workers' stop markers.
    pub fn dispatch(&self, job: WriteJob) -> Result<(), WriteJob> {
        let closed = self.closed.read().unwrap();
        if *closed {
            return Err(job);
        }
        match self.tx.send(Msg::Job(Box::new(job))) {
            Ok(()) => Ok(()),
            Err(e) => match e.0 {
                Msg::Job(job) => Err(*job),
                Msg::Stop => unreachable!("handles only send jobs"),
            },
        }
    }
}

type WriteFn = dyn Fn(&WriteJob) -> Result<(), ExportError> + Send + Sync;

/// Fixed-size worker pool gated by an independent concurrency semaphore.
///
/// Worker threads scale as `max(2, parallelism / 2)`; the semaphore holds
/// one permit per unit of parallelism. Every job is finalized on the tracker
/// exactly once, success or failure — a failed write records the object and
/// still counts, so one bad file never stalls the batch.
pub struct WriterPool {
    tx: Sender<Msg>,
    closed: Arc<RwLock<bool>>,
    workers: Vec<JoinHandle<()>>,
    semaphore: Arc<Semaphore>,
}

impl WriterPool {
    /// Pool scaled to the machine's available parallelism.
    pub fn new(tracker: Arc<ProgressTracker>) -> Self {
        Self::with_parallelism(tracker, num_cpus::get())
    }

    /// Pool with an explicit permit count.
    pub fn with_parallelism(tracker: Arc<ProgressTracker>, parallelism: usize) -> Self {
        Self::with_write_fn(tracker, parallelism, Arc::new(write_png))
    }

    /// The write step is injectable so tests can instrument permit
    /// accounting and force I/O failures.
    fn with_write_fn(
        tracker: Arc<ProgressTracker>,
        parallelism: usize,
        write_fn: Arc<WriteFn>,
    ) -> Self {
        let parallelism = parallelism.max(1);
        let (tx, rx) = crossbeam_channel::unbounded::<Msg>();
        let closed = Arc::new(RwLock::new(false));
        let semaphore = Arc::new(Semaphore::new(parallelism));

        let threads = (parallelism / 2).max(2);
        let workers = (0..threads)
            .map(|i| {
                let rx = rx.clone();
                let semaphore = Arc::clone(&semaphore);
                let tracker = Arc::clone(&tracker);
                let write_fn = Arc::clone(&write_fn);
                std::thread::Builder::new()
                    .name(format!("iconforge-writer-{i}"))
                    .spawn(move || worker_loop(rx, semaphore, tracker, write_fn))
                    .expect("failed to spawn writer thread")
            })
            .collect();

        Self {
            tx,
            closed,
            workers,
            semaphore,
        }
    }

    /// Dispatch handle for capture callbacks.
    pub fn handle(&self) -> WriterHandle {
        WriterHandle {
            tx: self.tx.clone(),
            closed: Arc::clone(&self.closed),
        }
    }

    /// Closes the intake and joins the workers.
    ///
    /// Jobs already accepted run to completion first; only new dispatches
    /// are refused. The write lock waits out dispatches in progress, so no
    /// accepted job can land behind the stop markers. Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut closed = self.closed.write().unwrap();
            if !*closed {
                *closed = true;
                // One stop marker per worker, queued behind all real jobs.
                for _ in &self.workers {
                    let _ = self.tx.send(Msg::Stop);
                }
            }
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("writer thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WriterPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    rx: Receiver<Msg>,
    semaphore: Arc<Semaphore>,
    tracker: Arc<ProgressTracker>,
    write_fn: Arc<WriteFn>,
) {
    for msg in rx.iter() {
        let job = match msg {
            Msg::Job(job) => job,
            Msg::Stop => break,
        };

        // The permit wait blocks this worker only. A closed semaphore is the
        // interrupted outcome: the object fails but is still counted.
        let permit = match pollster::block_on(semaphore.acquire()) {
            Ok(permit) => permit,
            Err(_) => {
                let err = ExportError::Interrupted {
                    object: job.object.clone(),
                };
                log::error!("{err}");
                tracker.fail_one(job.object);
                continue;
            }
        };

        match write_fn(&job) {
            Ok(()) => log::debug!("exported {}", job.path.display()),
            Err(e) => {
                log::error!("failed to save exported image for {}: {e}", job.object);
                tracker.record_failure(job.object.clone());
            }
        }

        drop(permit);
        // Exactly once per job, regardless of outcome.
        tracker.complete_one();
    }
}

/// Encodes one frame as RGBA8 PNG at `job.path`.
fn write_png(job: &WriteJob) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: job.path.clone(),
        source,
    };

    let file = File::create(&job.path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer)
        .write_image(
            job.image.pixels(),
            job.image.width(),
            job.image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| io_err(std::io::Error::other(e)))?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::export::size::ExportSize;

    fn job(n: usize, dir: &Path) -> WriteJob {
        let object = ObjectId::new("test", format!("object_{n:03}"));
        let image = PixelImage::from_rgba(4, 4, vec![0u8; 64]);
        let path = dir.join(crate::export::naming::file_name(&object));
        WriteJob {
            object,
            image,
            path,
        }
    }

    #[test]
    fn written_pngs_carry_requested_dimensions_for_every_size() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(ExportSize::ALL.len()));
        let mut pool = WriterPool::with_parallelism(Arc::clone(&tracker), 2);
        let handle = pool.handle();
        for size in ExportSize::ALL {
            let edge = size.edge();
            let object = ObjectId::new("test", format!("icon_{edge}"));
            let pixels = vec![0u8; (edge * edge * 4) as usize];
            let path = dir.path().join(crate::export::naming::file_name(&object));
            handle
                .dispatch(WriteJob {
                    object,
                    image: PixelImage::from_rgba(edge, edge, pixels),
                    path,
                })
                .unwrap();
        }
        pool.shutdown();

        assert_eq!(tracker.completed(), ExportSize::ALL.len());
        assert_eq!(tracker.failed_count(), 0);
        for size in ExportSize::ALL {
            let edge = size.edge();
            let path = dir.path().join(format!("test_icon_{edge}.png"));
            let bytes = std::fs::read(&path).unwrap();
            // PNG signature + IHDR dimensions (big-endian at offsets 16/20).
            assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
            assert_eq!(u32::from_be_bytes(bytes[16..20].try_into().unwrap()), edge);
            assert_eq!(u32::from_be_bytes(bytes[20..24].try_into().unwrap()), edge);
        }
    }

    #[test]
    fn scenario_100_objects_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(100));
        let mut pool = WriterPool::with_parallelism(Arc::clone(&tracker), 4);
        let handle = pool.handle();
        for n in 0..100 {
            handle.dispatch(job(n, dir.path())).unwrap();
        }
        pool.shutdown();

        assert_eq!(tracker.completed(), 100);
        assert_eq!(tracker.failed_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 100);
    }

    #[test]
    fn scenario_100_objects_7_io_failures() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(100));
        // Force I/O failure for 7 chosen objects, write the rest for real.
        let write_fn: Arc<WriteFn> = Arc::new(|job: &WriteJob| {
            let n: usize = job.object.name["object_".len()..].parse().unwrap();
            if n % 13 == 0 {
                // 0, 13, 26, 39, 52, 65, 78 — seven of a hundred.
                return Err(ExportError::Io {
                    path: job.path.clone(),
                    source: std::io::Error::other("forced failure"),
                });
            }
            write_png(job)
        });
        let mut pool = WriterPool::with_write_fn(Arc::clone(&tracker), 4, write_fn);
        let handle = pool.handle();
        for n in 0..100 {
            handle.dispatch(job(n, dir.path())).unwrap();
        }
        pool.shutdown();

        let written = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(tracker.completed(), 100);
        assert_eq!(tracker.failed_count(), 7);
        assert_eq!(written, 93);
        assert_eq!(tracker.failed_count() + written, 100);
    }

    #[test]
    fn permit_accounting_never_exceeds_parallelism() {
        const PARALLELISM: usize = 3;
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(60));

        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (live_w, peak_w) = (Arc::clone(&live), Arc::clone(&peak));
        let write_fn: Arc<WriteFn> = Arc::new(move |_job: &WriteJob| {
            let now = live_w.fetch_add(1, Ordering::SeqCst) + 1;
            peak_w.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            live_w.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });

        let mut pool = WriterPool::with_write_fn(Arc::clone(&tracker), PARALLELISM, write_fn);
        let handle = pool.handle();
        for n in 0..60 {
            handle.dispatch(job(n, dir.path())).unwrap();
        }
        pool.shutdown();

        assert_eq!(tracker.completed(), 60);
        assert!(peak.load(Ordering::SeqCst) <= PARALLELISM);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn nonexistent_directory_fails_but_counts() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(1));
        let mut pool = WriterPool::with_parallelism(Arc::clone(&tracker), 2);
        let handle = pool.handle();

        let mut bad = job(0, dir.path());
        bad.path = dir.path().join("missing").join("out.png");
        handle.dispatch(bad).unwrap();
        pool.shutdown();

        assert_eq!(tracker.completed(), 1);
        assert_eq!(
            tracker.failed_snapshot(),
            vec![ObjectId::new("test", "object_000")]
        );
    }

    #[test]
    fn closed_semaphore_is_interrupted_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(2));
        let mut pool = WriterPool::with_parallelism(Arc::clone(&tracker), 2);
        pool.semaphore.close();
        let handle = pool.handle();
        for n in 0..2 {
            handle.dispatch(job(n, dir.path())).unwrap();
        }
        pool.shutdown();

        // Both interrupted: failed but fully counted.
        assert_eq!(tracker.completed(), 2);
        assert_eq!(tracker.failed_count(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn dispatch_after_shutdown_returns_job() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(1));
        let mut pool = WriterPool::with_parallelism(Arc::clone(&tracker), 2);
        let handle = pool.handle();
        pool.shutdown();

        let returned = handle.dispatch(job(0, dir.path()));
        assert!(returned.is_err());
        // Nothing was finalized by the pool; the caller owns the outcome.
        assert_eq!(tracker.completed(), 0);
    }

    #[test]
    fn concurrent_shutdown_never_strands_accepted_jobs() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 50;
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(ProgressTracker::new(THREADS * PER_THREAD));
        let write_fn: Arc<WriteFn> = Arc::new(|_job: &WriteJob| Ok(()));
        let mut pool = WriterPool::with_write_fn(Arc::clone(&tracker), 2, write_fn);

        let accepted = Arc::new(AtomicUsize::new(0));
        let dispatchers: Vec<_> = (0..THREADS)
            .map(|t| {
                let handle = pool.handle();
                let accepted = Arc::clone(&accepted);
                let dir = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        if handle.dispatch(job(t * PER_THREAD + i, &dir)).is_ok() {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        std::thread::sleep(Duration::from_millis(1));
        pool.shutdown();
        for d in dispatchers {
            d.join().unwrap();
        }

        // Every accepted dispatch was finalized, none stranded in the queue.
        assert_eq!(tracker.completed(), accepted.load(Ordering::SeqCst));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let tracker = Arc::new(ProgressTracker::new(0));
        let mut pool = WriterPool::with_parallelism(tracker, 2);
        pool.shutdown();
        pool.shutdown();
    }
}
