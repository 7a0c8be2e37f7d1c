//! Error types for scene import and image decode.

use std::path::PathBuf;

/// Errors that can occur while importing a scene.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Failed to open or parse the file.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File being imported.
        path: PathBuf,
        /// Underlying glTF error.
        #[source]
        source: gltf_dep::Error,
    },
    /// The file parsed but holds no usable triangle meshes.
    #[error("{path} contains no meshes")]
    NoMeshes {
        /// File being imported.
        path: PathBuf,
    },
    /// A primitive is missing position data.
    #[error("mesh {mesh} primitive {primitive} has no POSITION attribute")]
    MissingPositions {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },
    /// A primitive topology that the requested flags cannot handle.
    #[error("mesh {mesh} primitive {primitive}: unsupported topology {mode}")]
    UnsupportedTopology {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// Topology name.
        mode: &'static str,
    },
    /// Accessor data is inconsistent.
    #[error("mesh {mesh} primitive {primitive}: {message}")]
    Accessor {
        /// Mesh index in the document.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// What went wrong.
        message: String,
    },
}

/// Errors that can occur while decoding an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The file could not be read or decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        /// File being decoded.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },
    /// The image has no pixels.
    #[error("{path} is empty")]
    Empty {
        /// File being decoded.
        path: PathBuf,
    },
}
