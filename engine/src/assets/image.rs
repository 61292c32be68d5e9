//! Image decoding boundary
//!
//! Textures never decode files themselves. They are built from a
//! [`DecodedImage`] produced by an [`ImageDecoder`]; the default decoder
//! wraps the `image` crate and keeps the file's native channel count so the
//! texture layer can decide which formats it accepts.

use std::path::Path;

use glam::UVec2;
use image::DynamicImage;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Tightly packed 8-bit pixel rows, top row first unless flipped on load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Interleaved channels per pixel
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * channels as usize,
            "pixel data does not match image dimensions"
        );
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Single-color image, handy for placeholder textures
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, 4, pixels)
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Turns an image file into raw pixels
pub trait ImageDecoder {
    /// Decode the file at `path`, optionally flipping rows so the first row
    /// is the bottom of the image
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage>;
}

/// [`ImageDecoder`] backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl ImageFileDecoder {
    /// Decode an in-memory encoded image (PNG, JPEG)
    pub fn decode_bytes(
        &self,
        bytes: &[u8],
        origin: &Path,
        flip_vertically: bool,
    ) -> Result<DecodedImage> {
        let image = image::load_from_memory(bytes).map_err(|e| EngineError::ImageDecode {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(into_decoded(image, flip_vertically))
    }
}

impl ImageDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path, flip_vertically: bool) -> Result<DecodedImage> {
        let image = image::open(path).map_err(|e| EngineError::ImageDecode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let decoded = into_decoded(image, flip_vertically);
        debug!(
            path = %path.display(),
            width = decoded.width,
            height = decoded.height,
            channels = decoded.channels,
            "Decoded image"
        );
        Ok(decoded)
    }
}

fn into_decoded(image: DynamicImage, flip_vertically: bool) -> DecodedImage {
    let image = if flip_vertically { image.flipv() } else { image };
    let (width, height) = (image.width(), image.height());
    let channels = image.color().channel_count();

    // Deeper formats are narrowed to 8 bits per channel
    let pixels = match channels {
        1 => image.into_luma8().into_raw(),
        2 => image.into_luma_alpha8().into_raw(),
        3 => image.into_rgb8().into_raw(),
        _ => image.into_rgba8().into_raw(),
    };
    let channels = channels.min(4);

    DecodedImage {
        width,
        height,
        channels,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_solid_image_layout() {
        let image = DecodedImage::solid(2, 3, [10, 20, 30, 255]);
        assert_eq!(image.pixels.len(), 2 * 3 * 4);
        assert_eq!(&image.pixels[4..8], &[10, 20, 30, 255]);
        assert_eq!(image.size(), UVec2::new(2, 3));
    }

    #[test]
    fn test_decode_keeps_channel_count() {
        let dir = tempfile::tempdir().unwrap();

        let rgb_path = dir.path().join("rgb.png");
        RgbImage::new(4, 2).save(&rgb_path).unwrap();
        let gray_path = dir.path().join("gray.png");
        GrayImage::new(4, 2).save(&gray_path).unwrap();

        let rgb = ImageFileDecoder.decode(&rgb_path, false).unwrap();
        assert_eq!((rgb.width, rgb.height, rgb.channels), (4, 2, 3));
        assert_eq!(rgb.pixels.len(), 4 * 2 * 3);

        let gray = ImageFileDecoder.decode(&gray_path, false).unwrap();
        assert_eq!(gray.channels, 1);
    }

    #[test]
    fn test_flip_reverses_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.png");

        let mut source = RgbaImage::new(1, 2);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        source.save(&path).unwrap();

        let flipped = ImageFileDecoder.decode(&path, true).unwrap();
        assert_eq!(&flipped.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&flipped.pixels[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = ImageFileDecoder
            .decode(Path::new("does/not/exist.png"), false)
            .unwrap_err();
        assert!(matches!(err, EngineError::ImageDecode { .. }));
    }
}
