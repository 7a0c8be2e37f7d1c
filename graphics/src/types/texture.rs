//! Texture types and descriptors.

use super::Extent3d;
use bitflags::bitflags;

/// Texture format enumeration.
///
/// Only 8-bit-per-channel color formats are needed for decoded asset images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 8-bit RG channels, unsigned normalized.
    Rg8Unorm,
    /// 8-bit RGB channels, unsigned normalized.
    Rgb8Unorm,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
}

impl TextureFormat {
    /// Format for tightly packed 8-bit pixels with `channels` channels.
    pub fn from_channel_count(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8Unorm),
            2 => Some(Self::Rg8Unorm),
            3 => Some(Self::Rgb8Unorm),
            4 => Some(Self::Rgba8Unorm),
            _ => None,
        }
    }

    /// Number of channels per pixel.
    pub fn channel_count(&self) -> u8 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm => 2,
            Self::Rgb8Unorm => 3,
            Self::Rgba8Unorm => 4,
        }
    }

    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        u32::from(self.channel_count())
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied to.
        const COPY_DST = 1 << 0;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 1;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture.
    pub size: Extent3d,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            format,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of bytes a full upload of this texture must contain.
    pub fn upload_size(&self) -> u64 {
        self.size.texel_count() * u64::from(self.format.block_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Some(TextureFormat::R8Unorm))]
    #[case(2, Some(TextureFormat::Rg8Unorm))]
    #[case(3, Some(TextureFormat::Rgb8Unorm))]
    #[case(4, Some(TextureFormat::Rgba8Unorm))]
    #[case(0, None)]
    #[case(5, None)]
    fn test_from_channel_count(#[case] channels: u8, #[case] expected: Option<TextureFormat>) {
        let format = TextureFormat::from_channel_count(channels);
        assert_eq!(format, expected);
        if let Some(format) = format {
            assert_eq!(format.channel_count(), channels);
        }
    }

    #[test]
    fn test_upload_size() {
        let desc = TextureDescriptor::new_2d(4, 2, TextureFormat::Rgb8Unorm, TextureUsage::COPY_DST);
        assert_eq!(desc.upload_size(), 24);
    }
}
