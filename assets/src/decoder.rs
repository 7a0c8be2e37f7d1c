//! Image-decode service.

use std::path::Path;

use image::{ColorType, DynamicImage};

use crate::error::ImageError;

/// Tightly packed 8-bit pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channels per pixel (1 to 4).
    pub channels: u8,
    /// Row-major pixel data, top row first.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Bytes a well-formed image of these dimensions holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }
}

/// Image-decode service.
pub trait ImageDecoder {
    /// Decode the image at `path`, keeping its channel count.
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageError>;
}

impl<T: ImageDecoder + ?Sized> ImageDecoder for Box<T> {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageError> {
        (**self).decode(path)
    }
}

/// [`ImageDecoder`] backed by the `image` crate.
///
/// Higher bit depths are narrowed to 8 bits per channel; the channel count
/// is never changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageError> {
        let image = image::open(path).map_err(|source| ImageError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ImageError::Empty {
                path: path.to_path_buf(),
            });
        }
        let color = image.color();
        let channels = color.channel_count();
        let pixels = into_8bit(image, color);
        log::trace!(
            "decoded {}: {width}x{height}, {channels} channel(s)",
            path.display()
        );
        Ok(DecodedImage {
            width,
            height,
            channels,
            pixels,
        })
    }
}

fn into_8bit(image: DynamicImage, color: ColorType) -> Vec<u8> {
    match color {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => image.into_bytes(),
        _ => match color.channel_count() {
            1 => image.into_luma8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            _ => image.into_rgba8().into_raw(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = ImageCrateDecoder::new()
            .decode(Path::new("no/such/image.png"))
            .unwrap_err();
        assert!(matches!(err, ImageError::Decode { .. }));
    }

    #[test]
    fn test_sixteen_bit_narrowed() {
        let image = DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(
            2,
            1,
            image::Rgb([0xffffu16, 0, 0x8080]),
        ));
        let color = image.color();
        let bytes = into_8bit(image, color);
        assert_eq!(bytes, vec![0xff, 0, 0x80, 0xff, 0, 0x80]);
    }
}
