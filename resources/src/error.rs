//! Errors reported by cache operations.

use cinder_assets::{ImageError, ImportError};
use cinder_core::{ErrorKind, Handle, PoolError};
use cinder_graphics::GraphicsError;

/// Error returned by every texture and model cache operation.
///
/// [`kind`](Self::kind) classifies it into the shared [`ErrorKind`]
/// taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The path was empty.
    #[error("missing path")]
    NullArgument,
    /// The cache configuration is unusable.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
    /// The image decoder failed.
    #[error("failed to load texture {path}")]
    Decode {
        /// Texture path.
        path: String,
        /// Decoder error.
        #[source]
        source: ImageError,
    },
    /// The scene importer failed.
    #[error("failed to import model {path}")]
    Import {
        /// Model path.
        path: String,
        /// Importer error.
        #[source]
        source: ImportError,
    },
    /// The imported scene has no meshes.
    #[error("model {path} has no meshes")]
    NoMeshes {
        /// Model path.
        path: String,
    },
    /// The imported scene is internally inconsistent.
    #[error("model {path} is malformed: {reason}")]
    InvalidScene {
        /// Model path.
        path: String,
        /// What is wrong.
        reason: String,
    },
    /// The decoded image has a channel count other than 3 or 4.
    #[error("texture {path} has {channels} channel(s), expected RGB or RGBA")]
    UnsupportedChannels {
        /// Texture path.
        path: String,
        /// Channel count reported by the decoder.
        channels: u8,
    },
    /// A mesh has no diffuse texture.
    #[error("mesh {mesh} of model {path} has no diffuse texture")]
    MissingDiffuse {
        /// Model path.
        path: String,
        /// Mesh index in scene order.
        mesh: usize,
    },
    /// The graphics device refused an allocation or upload.
    #[error("graphics device failed for {path}")]
    Graphics {
        /// Resource path.
        path: String,
        /// Device error.
        #[source]
        source: GraphicsError,
    },
    /// The pool is full.
    #[error("{cache} cache exhausted (capacity {capacity})")]
    Exhausted {
        /// Which cache.
        cache: &'static str,
        /// Pool capacity.
        capacity: usize,
    },
    /// The handle index lies outside the pool.
    #[error("{cache} handle index {index} outside pool of capacity {capacity}")]
    Bounds {
        /// Which cache.
        cache: &'static str,
        /// Offending index.
        index: u32,
        /// Pool capacity.
        capacity: usize,
    },
    /// The handle refers to a freed or reused slot.
    #[error("stale {cache} handle {handle}, already freed")]
    Stale {
        /// Which cache.
        cache: &'static str,
        /// Offending handle.
        handle: Handle,
    },
    /// A reference count would drop below zero.
    #[error("{cache} refcount underflow for {path}")]
    RefcountUnderflow {
        /// Which cache.
        cache: &'static str,
        /// Entry path.
        path: String,
    },
    /// The hash index and the pool disagree.
    #[error("{cache} hash chain corrupted")]
    ChainCorrupted {
        /// Which cache.
        cache: &'static str,
        /// Pool error.
        #[source]
        source: PoolError,
    },
}

impl ResourceError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullArgument => ErrorKind::NullArgument,
            Self::Decode { .. }
            | Self::Import { .. }
            | Self::NoMeshes { .. }
            | Self::InvalidScene { .. } => ErrorKind::FileError,
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::Bounds { .. } => ErrorKind::Bounds,
            Self::InvalidConfig(_)
            | Self::UnsupportedChannels { .. }
            | Self::MissingDiffuse { .. }
            | Self::Graphics { .. }
            | Self::Stale { .. }
            | Self::RefcountUnderflow { .. }
            | Self::ChainCorrupted { .. } => ErrorKind::Internal,
        }
    }

    /// Map a pool error raised by `cache`.
    pub(crate) fn from_pool(cache: &'static str, err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { capacity } => Self::Exhausted { cache, capacity },
            PoolError::Bounds { index, capacity } => Self::Bounds {
                cache,
                index,
                capacity,
            },
            PoolError::Stale { handle } => Self::Stale { cache, handle },
            other => Self::ChainCorrupted {
                cache,
                source: other,
            },
        }
    }

    /// Log this error at its source and hand it back.
    pub(crate) fn report(self) -> Self {
        match std::error::Error::source(&self) {
            Some(source) => log::error!("{self}: {source}"),
            None => log::error!("{self}"),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ResourceError::NullArgument.kind(), ErrorKind::NullArgument);
        assert_eq!(
            ResourceError::UnsupportedChannels {
                path: "a.png".into(),
                channels: 1
            }
            .kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            ResourceError::NoMeshes {
                path: "m.gltf".into()
            }
            .kind(),
            ErrorKind::FileError
        );
    }

    #[test]
    fn test_pool_error_mapping() {
        let handle = Handle::from_raw_parts(3, 1);
        let err = ResourceError::from_pool("texture", PoolError::Stale { handle });
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = ResourceError::from_pool(
            "model",
            PoolError::Bounds {
                index: 9,
                capacity: 4,
            },
        );
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(
            err.to_string(),
            "model handle index 9 outside pool of capacity 4"
        );
    }
}
