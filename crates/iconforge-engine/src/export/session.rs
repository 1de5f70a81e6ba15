use std::path::PathBuf;
use std::sync::Arc;

use crate::device::FrameResources;
use crate::export::size::ExportSize;
use crate::export::tracker::ProgressTracker;
use crate::export::writer::{WriterHandle, WriterPool};
use crate::object::IconObject;
use crate::readback::InFlight;

/// Lifecycle of the exporter, advanced by [`Exporter::tick`].
///
/// [`Exporter::tick`]: crate::export::Exporter::tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No batch submitted, or the last one was closed.
    Idle,
    /// Objects are still being rendered or finalized.
    Running,
    /// Every object exported, no failures.
    Completed,
    /// Every object finalized, at least one failed.
    CompletedWithErrors,
    /// Cancelled by the caller; in-flight work drains, the rest is skipped.
    Cancelled,
}

/// One batch to export: where, how large, and what.
pub struct ExportRequest {
    pub directory: PathBuf,
    pub size: ExportSize,
    pub objects: Vec<IconObject>,
}

/// Everything owned for the lifetime of one batch.
///
/// Dropping the session without going through the orchestrator's teardown
/// would race in-flight readbacks against the target release, so the fields
/// stay crate-private and only `Exporter::close` takes them apart.
pub(crate) struct ExportSession {
    pub(crate) objects: Vec<IconObject>,
    /// Next object to render. Everything below it has a terminal outcome
    /// pending or recorded.
    pub(crate) cursor: usize,
    pub(crate) size: ExportSize,
    pub(crate) directory: PathBuf,
    pub(crate) tracker: Arc<ProgressTracker>,
    pub(crate) pool: WriterPool,
    pub(crate) handle: WriterHandle,
    pub(crate) resources: FrameResources,
    pub(crate) in_flight: Arc<InFlight>,
}
