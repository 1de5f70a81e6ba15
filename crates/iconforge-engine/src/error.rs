use std::path::PathBuf;

use crate::object::ObjectId;

/// Error kinds surfaced by the export pipeline.
///
/// `ResourceAllocation` is the one fatal kind: it aborts `submit` and no
/// session starts. Every other kind is a per-object outcome — the object
/// lands in the failure set, the completion counter advances, and the rest
/// of the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The GPU refused to allocate the off-screen target.
    #[error("failed to allocate {edge}x{edge} render target: {reason}")]
    ResourceAllocation { edge: u32, reason: String },

    /// Drawing a single object failed.
    #[error("failed to render {object}: {reason}")]
    Render { object: ObjectId, reason: String },

    /// Creating or writing a single output file failed.
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A writer was told to stop while waiting for a write permit.
    #[error("write permit wait interrupted for {object}")]
    Interrupted { object: ObjectId },
}

impl ExportError {
    /// Whether this error aborts the whole session rather than one object.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::ResourceAllocation { .. })
    }
}
