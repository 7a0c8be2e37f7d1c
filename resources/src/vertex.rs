//! GPU vertex format shared by every model.

use bytemuck::{Pod, Zeroable};
use cinder_graphics::types::{VertexAttribute, VertexAttributeFormat, VertexLayout};

/// Influence slots per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// Bone id marking an empty influence slot.
pub const NO_BONE: i32 = -1;

/// One row of a model's vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub tex_coord: [f32; 2],
    /// Normal.
    pub normal: [f32; 3],
    /// Bone index per influence slot, [`NO_BONE`] when empty.
    pub bone_ids: [i32; MAX_INFLUENCES],
    /// Weight per influence slot, zero when empty.
    pub bone_weights: [f32; MAX_INFLUENCES],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            tex_coord: [0.0; 2],
            normal: [0.0; 3],
            bone_ids: [NO_BONE; MAX_INFLUENCES],
            bone_weights: [0.0; MAX_INFLUENCES],
        }
    }
}

impl Vertex {
    /// Byte stride in the vertex buffer.
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    /// Attribute layout: position, tex coord, normal, bone ids, bone weights
    /// at locations 0 to 4.
    pub fn layout() -> VertexLayout {
        VertexLayout::new(Self::STRIDE)
            .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float3, 0))
            .with_attribute(VertexAttribute::new(1, VertexAttributeFormat::Float2, 12))
            .with_attribute(VertexAttribute::new(2, VertexAttributeFormat::Float3, 20))
            .with_attribute(VertexAttribute::new(3, VertexAttributeFormat::Int4, 32))
            .with_attribute(VertexAttribute::new(4, VertexAttributeFormat::Float4, 48))
    }

    /// Occupied influence slots as `(bone, weight)` pairs.
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.bone_ids
            .iter()
            .zip(&self.bone_weights)
            .filter(|(id, _)| **id != NO_BONE)
            .map(|(id, w)| (*id, *w))
    }
}
