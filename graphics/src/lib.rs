//! # Cinder Graphics
//!
//! Graphics-resource API consumed by the Cinder asset caches.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Trait for allocating, uploading and destroying GPU resources
//! - [`TextureId`], [`BufferId`], [`VertexArrayId`] - Opaque nonzero resource ids
//! - [`types`] - Descriptors for textures, samplers, buffers and vertex layouts
//! - [`DummyBackend`] - In-memory backend that records every upload
//! - `WgpuBackend` behind the `wgpu-backend` feature
//!
//! ## Example
//!
//! ```
//! use cinder_graphics::{DummyBackend, GraphicsDevice, SamplerDescriptor};
//! use cinder_graphics::types::{TextureDescriptor, TextureFormat, TextureUsage};
//!
//! let mut device = DummyBackend::new();
//! let desc = TextureDescriptor::new_2d(1, 1, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST);
//! let id = device.create_texture(&desc, &SamplerDescriptor::cache_default()).unwrap();
//! device.write_texture(id, &[255, 0, 0, 255]).unwrap();
//! device.destroy_texture(id).unwrap();
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{BufferId, DummyBackend, GraphicsDevice, TextureId, VertexArrayId};
#[cfg(feature = "wgpu-backend")]
pub use backend::wgpu_backend::WgpuBackend;
pub use error::GraphicsError;
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, SamplerDescriptor, TextureDescriptor, TextureFormat,
    TextureUsage, VertexLayout,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("Cinder Graphics v{} initialized", VERSION);
}
