//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! passed to a [`GraphicsDevice`](crate::GraphicsDevice).

mod buffer;
mod common;
mod layout;
mod sampler;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use common::Extent3d;
pub use layout::{VertexAttribute, VertexAttributeFormat, VertexLayout};
pub use sampler::{AddressMode, FilterMode, SamplerDescriptor};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};
