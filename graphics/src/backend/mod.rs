//! GPU backend abstraction layer.
//!
//! Backends implement [`GraphicsDevice`], the small resource API the asset
//! caches need: allocate, upload and destroy textures, buffers and vertex
//! arrays. Every resource is named by an opaque nonzero id.
//!
//! # Available Backends
//!
//! - [`DummyBackend`]: records every call in memory, for tests and tools
//! - `WgpuBackend` (feature `wgpu-backend`): cross-platform backend using wgpu
//!
//! All calls are expected from the single thread that owns the device.

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::fmt;
use std::num::NonZeroU32;

use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, SamplerDescriptor, TextureDescriptor, VertexLayout};

pub use dummy::DummyBackend;

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wrap a raw id. Returns `None` for zero.
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            /// The raw nonzero id.
            pub fn get(&self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

gpu_id!(
    /// Opaque id of a GPU texture (with its sampling state).
    TextureId,
    "tex"
);
gpu_id!(
    /// Opaque id of a GPU buffer.
    BufferId,
    "buf"
);
gpu_id!(
    /// Opaque id of a vertex array binding a vertex and index buffer.
    VertexArrayId,
    "vao"
);

/// Graphics-resource API used by the asset caches.
pub trait GraphicsDevice {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Allocate a texture with fixed sampling state.
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        sampler: &SamplerDescriptor,
    ) -> Result<TextureId, GraphicsError>;

    /// Upload the full pixel contents of a texture.
    ///
    /// `data` must hold exactly [`TextureDescriptor::upload_size`] bytes.
    fn write_texture(&mut self, texture: TextureId, data: &[u8]) -> Result<(), GraphicsError>;

    /// Release a texture. The id is never handed out again.
    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError>;

    /// Allocate a buffer.
    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, GraphicsError>;

    /// Write `data` into a buffer at byte `offset`.
    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Release a buffer.
    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError>;

    /// Allocate an empty vertex array.
    fn create_vertex_array(&mut self, label: Option<&str>) -> Result<VertexArrayId, GraphicsError>;

    /// Bind a vertex and index buffer to a vertex array with the given layout.
    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<(), GraphicsError>;

    /// Release a vertex array. The bound buffers are not released.
    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<(), GraphicsError>;
}

impl<D: GraphicsDevice + ?Sized> GraphicsDevice for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        sampler: &SamplerDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        (**self).create_texture(descriptor, sampler)
    }

    fn write_texture(&mut self, texture: TextureId, data: &[u8]) -> Result<(), GraphicsError> {
        (**self).write_texture(texture, data)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        (**self).destroy_texture(texture)
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, GraphicsError> {
        (**self).create_buffer(descriptor)
    }

    fn write_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        (**self).write_buffer(buffer, offset, data)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), GraphicsError> {
        (**self).destroy_buffer(buffer)
    }

    fn create_vertex_array(&mut self, label: Option<&str>) -> Result<VertexArrayId, GraphicsError> {
        (**self).create_vertex_array(label)
    }

    fn configure_vertex_layout(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<(), GraphicsError> {
        (**self).configure_vertex_layout(vertex_array, vertex_buffer, index_buffer, layout)
    }

    fn destroy_vertex_array(&mut self, vertex_array: VertexArrayId) -> Result<(), GraphicsError> {
        (**self).destroy_vertex_array(vertex_array)
    }
}
