//! Batch icon export.
//!
//! [`Exporter`] drives the whole flow: render each object into the
//! off-screen target, capture the pixels asynchronously, and hand finished
//! frames to a bounded writer pool that encodes PNGs. Progress is tracked
//! lock-free so the caller can poll it from the driving thread while
//! writers finalize objects from theirs.

pub mod naming;
mod orchestrator;
mod session;
pub mod size;
mod tracker;
mod writer;

pub use orchestrator::{BATCH_SIZE, Exporter};
pub use session::{ExportRequest, SessionState};
pub use size::ExportSize;
pub use tracker::ProgressTracker;
pub use writer::{WriteJob, WriterHandle, WriterPool};
