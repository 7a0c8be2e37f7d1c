//! Graphics error types.

use crate::backend::{BufferId, TextureId, VertexArrayId};

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// The device refused to allocate a resource.
    #[error("{resource} allocation refused: {reason}")]
    AllocationRefused {
        /// Kind of resource requested.
        resource: &'static str,
        /// Backend-provided reason.
        reason: String,
    },
    /// No live texture with this id.
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),
    /// No live buffer with this id.
    #[error("unknown buffer {0}")]
    UnknownBuffer(BufferId),
    /// No live vertex array with this id.
    #[error("unknown vertex array {0}")]
    UnknownVertexArray(VertexArrayId),
    /// Upload data does not match the destination size.
    #[error("invalid upload size: expected {expected} bytes, got {actual}")]
    InvalidUploadSize {
        /// Bytes the destination can take.
        expected: u64,
        /// Bytes supplied.
        actual: u64,
    },
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
