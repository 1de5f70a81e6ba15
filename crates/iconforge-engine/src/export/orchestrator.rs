//! Batch export driver.
//!
//! The orchestrator owns the GPU handle, the rasterizer, and at most one
//! live session. Callers pump it with [`Exporter::tick`] from a single
//! thread; rendering stays on that thread while readback completions and
//! PNG encoding land on the writer pool.

use std::path::Path;
use std::sync::Arc;

use crate::device::{COLOR_FORMAT, FrameResources, Gpu};
use crate::error::ExportError;
use crate::export::naming;
use crate::export::session::{ExportRequest, ExportSession, SessionState};
use crate::export::tracker::ProgressTracker;
use crate::export::writer::{WriteJob, WriterHandle, WriterPool};
use crate::object::{IconObject, ObjectId};
use crate::readback::{self, InFlight};
use crate::render::{AmbientScope, AmbientState, Rasterizer, RenderCtx, TargetBinding, camera};

/// Default objects rendered per [`Exporter::tick`].
pub const BATCH_SIZE: usize = 16;

pub struct Exporter {
    gpu: Arc<Gpu>,
    rasterizer: Rasterizer,
    ambient: AmbientState,
    state: SessionState,
    cancelled: bool,
    session: Option<ExportSession>,
}

impl Exporter {
    pub fn new(gpu: Arc<Gpu>) -> Self {
        Self {
            gpu,
            rasterizer: Rasterizer::new(),
            ambient: AmbientState::default(),
            state: SessionState::Idle,
            cancelled: false,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `(completed, total)` for the live session, `(0, 0)` when idle.
    pub fn progress(&self) -> (usize, usize) {
        self.session
            .as_ref()
            .map_or((0, 0), |s| s.tracker.progress())
    }

    /// Objects that failed so far, sorted by id.
    pub fn failed(&self) -> Vec<ObjectId> {
        self.session
            .as_ref()
            .map_or_else(Vec::new, |s| s.tracker.failed_snapshot())
    }

    /// Starts a new session, closing any previous one first.
    ///
    /// Creates the output directory and allocates the render target up
    /// front; a refused allocation is fatal for the whole batch and leaves
    /// the exporter idle.
    pub fn submit(&mut self, request: ExportRequest) -> Result<(), ExportError> {
        self.close();

        std::fs::create_dir_all(&request.directory).map_err(|source| ExportError::Io {
            path: request.directory.clone(),
            source,
        })?;
        log::info!("exporting into {}", request.directory.display());

        let resources = FrameResources::allocate(self.gpu.device(), request.size.edge())?;

        let tracker = Arc::new(ProgressTracker::new(request.objects.len()));
        let pool = WriterPool::new(Arc::clone(&tracker));
        let handle = pool.handle();

        log::info!(
            "starting export of {} objects at {}",
            request.objects.len(),
            request.size
        );

        self.session = Some(ExportSession {
            objects: request.objects,
            cursor: 0,
            size: request.size,
            directory: request.directory,
            tracker,
            pool,
            handle,
            resources,
            in_flight: Arc::new(InFlight::default()),
        });
        self.cancelled = false;
        self.state = SessionState::Running;
        Ok(())
    }

    /// Renders up to `batch` objects, pumps the device, and refreshes the
    /// session state. Returns whether another tick is needed.
    ///
    /// Per-object failures are recorded and counted, never propagated; the
    /// batch always runs to a terminal state.
    pub fn tick(&mut self, batch: usize) -> bool {
        if let Some(session) = self.session.as_mut() {
            if self.state == SessionState::Running {
                let ExportSession {
                    objects,
                    cursor,
                    size,
                    directory,
                    tracker,
                    handle,
                    resources,
                    in_flight,
                    ..
                } = session;
                let edge = size.edge();
                let ctx = RenderCtx::new(self.gpu.device(), self.gpu.queue(), COLOR_FORMAT, edge);
                let projection = camera::projection(edge);

                consume_batch(
                    objects,
                    cursor,
                    tracker,
                    batch,
                    || self.cancelled,
                    |object| {
                        let mut scope = AmbientScope::bind(
                            &mut self.ambient,
                            TargetBinding {
                                label: "iconforge export target",
                                edge,
                            },
                            projection,
                        );
                        let rendered =
                            self.rasterizer.render_one(&ctx, resources, &mut scope, object);
                        drop(scope);

                        match rendered {
                            Ok(()) => capture_object(
                                self.gpu.as_ref(),
                                resources,
                                directory,
                                tracker,
                                handle,
                                in_flight,
                                &object.id,
                            ),
                            Err(e) => {
                                log::error!("{e}");
                                tracker.fail_one(object.id.clone());
                            }
                        }
                    },
                );
            }

            // Drives map_async completions for outstanding captures.
            self.gpu.pump();
        }

        self.update_state();
        self.has_work()
    }

    /// Stops consuming objects. Work already dispatched drains normally and
    /// still counts; everything after the cursor is abandoned uncounted.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Running {
            self.cancelled = true;
            self.state = SessionState::Cancelled;
            if let Some(session) = &self.session {
                log::warn!(
                    "export cancelled after {} of {} objects",
                    session.cursor,
                    session.objects.len()
                );
            }
        }
    }

    /// Tears the session down in dependency order: drain in-flight
    /// readbacks, stop the writers, then release the render target.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            while session.in_flight.count() > 0 {
                self.gpu.wait_idle();
            }
            session.pool.shutdown();
            session.resources.release();
        }
        self.state = SessionState::Idle;
        self.cancelled = false;
    }

    fn update_state(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if self.state != SessionState::Running {
            return;
        }
        let Some(next) = terminal_state(session.cursor, session.objects.len(), &session.tracker)
        else {
            return;
        };
        match next {
            SessionState::Completed => {
                log::info!("export finished: {} objects", session.tracker.total());
            }
            _ => {
                log::warn!(
                    "export finished: {} of {} objects failed",
                    session.tracker.failed_count(),
                    session.tracker.total()
                );
                for id in session.tracker.failed_snapshot() {
                    log::warn!("  failed: {id}");
                }
            }
        }
        self.state = next;
    }

    fn has_work(&self) -> bool {
        match self.state {
            SessionState::Running => true,
            SessionState::Cancelled => self.session.as_ref().is_some_and(|s| {
                s.tracker.completed() < s.cursor || s.in_flight.count() > 0
            }),
            SessionState::Idle | SessionState::Completed | SessionState::CompletedWithErrors => {
                false
            }
        }
    }
}

impl Drop for Exporter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumes up to `batch` objects from the cursor.
///
/// The cancel flag is re-checked before each object and nothing new starts
/// once it reads true; objects already consumed keep their outcome. Empty
/// meshes are counted as completed without rendering. Non-empty objects go
/// through `process`, which owns dispatch and failure recording.
fn consume_batch(
    objects: &[IconObject],
    cursor: &mut usize,
    tracker: &ProgressTracker,
    batch: usize,
    is_cancelled: impl Fn() -> bool,
    mut process: impl FnMut(&IconObject),
) {
    for _ in 0..batch {
        if is_cancelled() || *cursor >= objects.len() {
            break;
        }
        let object = &objects[*cursor];
        *cursor += 1;

        if object.is_empty() {
            log::debug!("skipping {}: empty mesh", object.id);
            tracker.complete_one();
            continue;
        }
        process(object);
    }
}

/// Terminal state once every object is consumed and finalized, else `None`.
fn terminal_state(
    cursor: usize,
    total_objects: usize,
    tracker: &ProgressTracker,
) -> Option<SessionState> {
    if cursor < total_objects || !tracker.is_done() {
        return None;
    }
    Some(if tracker.failed_count() == 0 {
        SessionState::Completed
    } else {
        SessionState::CompletedWithErrors
    })
}

/// Issues the async color readback for a just-rendered object.
///
/// The copy is queued before the next object renders, so queue ordering
/// guarantees it reads this object's pixels. The completion callback hands
/// the frame to the writer pool; if the pool is already gone the object is
/// failed but still counted.
fn capture_object(
    gpu: &Gpu,
    resources: &FrameResources,
    directory: &Path,
    tracker: &Arc<ProgressTracker>,
    handle: &WriterHandle,
    in_flight: &Arc<InFlight>,
    id: &ObjectId,
) {
    let Some(texture) = resources.color() else {
        tracker.fail_one(id.clone());
        return;
    };

    let path = directory.join(naming::file_name(id));
    let handle = handle.clone();
    let dispatch_tracker = Arc::clone(tracker);
    let failed_id = id.clone();
    let failed_tracker = Arc::clone(tracker);
    let object = id.clone();

    readback::capture_frame(
        gpu.device(),
        gpu.queue(),
        texture,
        Arc::clone(in_flight),
        move |image| {
            let job = WriteJob {
                object,
                image,
                path,
            };
            if let Err(job) = handle.dispatch(job) {
                log::error!("writer pool closed, dropping frame for {}", job.object);
                dispatch_tracker.fail_one(job.object);
            }
        },
        move |e| {
            log::error!("readback failed for {failed_id}: {e}");
            failed_tracker.fail_one(failed_id);
        },
    );
}
