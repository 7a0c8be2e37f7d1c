//! # Cinder Assets
//!
//! External asset collaborators used by the Cinder caches.
//!
//! ## Overview
//!
//! - [`SceneImporter`] turns a model file into an [`ImportedScene`]: flat
//!   triangle meshes with per-mesh bone lists and a diffuse texture path.
//!   [`GltfImporter`] implements it for `.gltf`/`.glb`.
//! - [`ImageDecoder`] turns an image file into tightly packed 8-bit pixels
//!   with the file's own channel count. [`ImageCrateDecoder`] implements it
//!   with the `image` crate.
//!
//! Both traits are object safe so callers can swap in in-memory fakes.

pub mod decoder;
pub mod error;
pub mod gltf;
mod postprocess;
pub mod scene;

pub use decoder::{DecodedImage, ImageCrateDecoder, ImageDecoder};
pub use error::{ImageError, ImportError};
pub use gltf::GltfImporter;
pub use scene::{
    ImportFlags, ImportedBone, ImportedMaterial, ImportedMesh, ImportedScene, SceneImporter,
    VertexWeight,
};

/// Assets library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
