//! # Cinder Resources
//!
//! Reference-counted, path-keyed caches for GPU textures and models.
//!
//! ## Overview
//!
//! - [`ResourceContext`] - Owns both caches, the graphics device and the
//!   asset collaborators; the entry point for loading and freeing
//! - [`TextureCache`] - Deduplicates image loads by literal path
//! - [`ModelCache`] - Flattens imported scenes into shared vertex and index
//!   buffers, one [`Submodel`] per mesh, each owning a texture reference
//! - [`skinning`] - Bone merging and weight normalisation
//! - [`Vertex`] - The 64-byte GPU vertex row
//!
//! Both pools have a fixed capacity; an entry is reclaimed only when its
//! reference count reaches zero.
//!
//! ## Example
//!
//! ```no_run
//! use cinder_assets::{GltfImporter, ImageCrateDecoder};
//! use cinder_graphics::DummyBackend;
//! use cinder_resources::{CacheConfig, ResourceContext};
//!
//! let mut ctx = ResourceContext::new(
//!     CacheConfig::default(),
//!     DummyBackend::new(),
//!     Box::new(GltfImporter::new()),
//!     Box::new(ImageCrateDecoder::new()),
//! )?;
//! let crate_model = ctx.load_model("assets/crate/crate.gltf")?;
//! for range in ctx.model(crate_model)?.draw_ranges() {
//!     println!("{} indices at {}", range.index_count, range.index_byte_offset);
//! }
//! ctx.free_model(Some(crate_model))?;
//! # Ok::<(), cinder_resources::ResourceError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod skinning;
pub mod texture;
pub mod vertex;

pub use config::CacheConfig;
pub use context::{CacheStats, LeakReport, PoolStats, ResourceContext};
pub use error::ResourceError;
pub use model::{DrawRange, Model, ModelCache, ModelRef, Submodel};
pub use skinning::{Bone, SkinningReport};
pub use texture::{Texture, TextureCache, TextureRef};
pub use vertex::Vertex;

/// Resources library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
