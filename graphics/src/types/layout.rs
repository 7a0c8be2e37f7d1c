//! Vertex layout definitions.
//!
//! A [`VertexLayout`] describes one interleaved vertex buffer: its stride and
//! the attributes read from it, each bound to a shader location.
//!
//! # Example
//!
//! ```
//! use cinder_graphics::types::{VertexAttribute, VertexAttributeFormat, VertexLayout};
//!
//! let layout = VertexLayout::new(20)
//!     .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float3, 0))
//!     .with_attribute(VertexAttribute::new(1, VertexAttributeFormat::Float2, 12));
//! assert!(layout.validate().is_ok());
//! ```

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// Four 32-bit signed integers.
    Int4,
}

impl VertexAttributeFormat {
    /// Get the size in bytes of this format.
    pub fn size(&self) -> u32 {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 | Self::Int4 => 16,
        }
    }
}

/// A single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader location.
    pub location: u32,
    /// Attribute format.
    pub format: VertexAttributeFormat,
    /// Byte offset within the vertex.
    pub offset: u32,
}

impl VertexAttribute {
    /// Create a new attribute.
    pub fn new(location: u32, format: VertexAttributeFormat, offset: u32) -> Self {
        Self {
            location,
            format,
            offset,
        }
    }
}

/// Layout of one interleaved vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices.
    pub stride: u32,
    /// Attributes, in location order.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create an empty layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Check that every attribute fits inside the stride and that no two
    /// attributes share a location.
    pub fn validate(&self) -> Result<(), String> {
        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.offset + attr.format.size() > self.stride {
                return Err(format!(
                    "attribute at location {} overruns stride {}",
                    attr.location, self.stride
                ));
            }
            if self.attributes[..i]
                .iter()
                .any(|other| other.location == attr.location)
            {
                return Err(format!("duplicate location {}", attr.location));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_overrun() {
        let layout =
            VertexLayout::new(8).with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float3, 0));
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_duplicate_location() {
        let layout = VertexLayout::new(32)
            .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float3, 0))
            .with_attribute(VertexAttribute::new(0, VertexAttributeFormat::Float2, 12));
        assert!(layout.validate().is_err());
    }
}
