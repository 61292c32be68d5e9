//! Texture objects

use std::path::Path;

use glam::UVec2;
use tracing::debug;

use crate::assets::image::DecodedImage;
use crate::error::{EngineError, Result};
use crate::graphics::device::{
    Gpu, InternalFormat, PixelFormat, TextureFilter, TextureId, TextureTarget, TextureWrap,
};

/// Storage and upload formats for an image with `channels` channels
///
/// Only three and four channel images are accepted; `srgb` selects gamma
/// corrected storage and does not change the accepted set.
pub fn channel_formats(
    channels: u8,
    srgb: bool,
    path: &Path,
) -> Result<(InternalFormat, PixelFormat)> {
    match (channels, srgb) {
        (4, true) => Ok((InternalFormat::Srgb8Alpha8, PixelFormat::Rgba)),
        (4, false) => Ok((InternalFormat::Rgba8, PixelFormat::Rgba)),
        (3, true) => Ok((InternalFormat::Srgb8, PixelFormat::Rgb)),
        (3, false) => Ok((InternalFormat::Rgb8, PixelFormat::Rgb)),
        _ => Err(EngineError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            channels,
        }),
    }
}

/// Fails unless `pixels` covers a `size` region of `format` pixels
fn check_pixel_data(pixels: &[u8], size: UVec2, format: PixelFormat) -> Result<()> {
    let expected = size.x as usize * size.y as usize * format.channels() as usize;
    if pixels.len() < expected {
        return Err(EngineError::PixelDataSize {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Backend texture handle with filter and wrap configuration
#[derive(Debug)]
pub struct TextureBuffer {
    gpu: Gpu,
    id: TextureId,
    target: TextureTarget,
    size: UVec2,
}

impl TextureBuffer {
    fn new(gpu: &Gpu, target: TextureTarget, size: UVec2) -> Result<Self> {
        let id = gpu.create_texture()?;
        Ok(Self {
            gpu: gpu.clone(),
            id,
            target,
            size,
        })
    }

    pub fn set_filter(&self, min: TextureFilter, mag: TextureFilter) {
        self.gpu.bind_texture(self.target, Some(self.id));
        self.gpu.set_texture_filter(self.target, min, mag);
        self.gpu.bind_texture(self.target, None);
    }

    pub fn set_wrap(&self, s: TextureWrap, t: TextureWrap) {
        self.gpu.bind_texture(self.target, Some(self.id));
        self.gpu.set_texture_wrap(self.target, s, t);
        self.gpu.bind_texture(self.target, None);
    }

    /// Bind to the currently active texture unit
    pub fn bind(&self) {
        self.gpu.bind_texture(self.target, Some(self.id));
    }

    /// Select texture unit `unit` and bind to it
    pub fn bind_to_unit(&self, unit: u32) {
        self.gpu.active_texture(unit);
        self.gpu.bind_texture(self.target, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_texture(self.target, None);
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Size in pixels
    pub fn size(&self) -> UVec2 {
        self.size
    }
}

impl Drop for TextureBuffer {
    fn drop(&mut self) {
        debug!(texture = self.id.raw(), "Deleting texture");
        self.gpu.delete_texture(self.id);
    }
}

/// Two-dimensional texture
///
/// Created with linear filtering and repeat wrapping.
#[derive(Debug)]
pub struct Texture2D {
    buffer: TextureBuffer,
    internal_format: InternalFormat,
}

impl Texture2D {
    /// Upload raw pixels in `format` and store them as `internal_format`
    pub fn new(
        gpu: &Gpu,
        pixels: &[u8],
        size: UVec2,
        internal_format: InternalFormat,
        format: PixelFormat,
    ) -> Result<Self> {
        check_pixel_data(pixels, size, format)?;
        let buffer = TextureBuffer::new(gpu, TextureTarget::Texture2D, size)?;

        buffer.bind();
        gpu.tex_image_2d(buffer.target, size, internal_format, format, pixels);
        gpu.set_texture_filter(buffer.target, TextureFilter::Linear, TextureFilter::Linear);
        gpu.set_texture_wrap(buffer.target, TextureWrap::Repeat, TextureWrap::Repeat);
        buffer.unbind();

        debug!(
            texture = buffer.id.raw(),
            width = size.x,
            height = size.y,
            ?internal_format,
            "Created 2D texture"
        );

        Ok(Self {
            buffer,
            internal_format,
        })
    }

    /// Create from a decoded image; `origin` names the source in errors
    pub fn from_image(gpu: &Gpu, image: &DecodedImage, srgb: bool, origin: &Path) -> Result<Self> {
        let (internal_format, format) = channel_formats(image.channels, srgb, origin)?;
        Self::new(gpu, &image.pixels, image.size(), internal_format, format)
    }

    /// Overwrite a `size` region at `offset` with pixels in `format`
    pub fn modify_data(
        &self,
        offset: UVec2,
        size: UVec2,
        format: PixelFormat,
        pixels: &[u8],
    ) -> Result<()> {
        check_pixel_data(pixels, size, format)?;
        debug_assert!(
            offset.x + size.x <= self.buffer.size.x && offset.y + size.y <= self.buffer.size.y,
            "texture region exceeds texture bounds"
        );
        self.buffer.bind();
        self.buffer
            .gpu
            .tex_sub_image_2d(self.buffer.target, offset, size, format, pixels);
        self.buffer.unbind();
        Ok(())
    }

    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }
}

impl std::ops::Deref for Texture2D {
    type Target = TextureBuffer;

    fn deref(&self) -> &TextureBuffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::headless::{GpuCommand, HeadlessDevice};
    use std::rc::Rc;

    #[test]
    fn test_channel_mapping() {
        let path = Path::new("a.png");
        assert_eq!(
            channel_formats(4, false, path).unwrap(),
            (InternalFormat::Rgba8, PixelFormat::Rgba)
        );
        assert_eq!(
            channel_formats(4, true, path).unwrap(),
            (InternalFormat::Srgb8Alpha8, PixelFormat::Rgba)
        );
        assert_eq!(
            channel_formats(3, false, path).unwrap(),
            (InternalFormat::Rgb8, PixelFormat::Rgb)
        );
        assert_eq!(
            channel_formats(3, true, path).unwrap(),
            (InternalFormat::Srgb8, PixelFormat::Rgb)
        );
    }

    #[test]
    fn test_unsupported_channels() {
        for channels in [0, 1, 2, 5] {
            let err = channel_formats(channels, false, Path::new("gray.png")).unwrap_err();
            match err {
                EngineError::UnsupportedPixelFormat { path, channels: c } => {
                    assert_eq!(path, Path::new("gray.png"));
                    assert_eq!(c, channels);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_texture_defaults() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let image = DecodedImage::solid(2, 2, [255, 255, 255, 255]);
        let texture = Texture2D::from_image(&gpu, &image, false, Path::new("white")).unwrap();

        let commands = device.commands();
        assert!(commands.contains(&GpuCommand::TextureFilter {
            min: TextureFilter::Linear,
            mag: TextureFilter::Linear,
        }));
        assert!(commands.contains(&GpuCommand::TextureWrap {
            s: TextureWrap::Repeat,
            t: TextureWrap::Repeat,
        }));
        assert_eq!(texture.size(), UVec2::new(2, 2));
        assert_eq!(texture.internal_format(), InternalFormat::Rgba8);
    }

    #[test]
    fn test_bind_to_unit_and_release() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let image = DecodedImage::new(1, 1, 3, vec![0, 0, 0]);
        let texture = Texture2D::from_image(&gpu, &image, true, Path::new("black")).unwrap();
        texture.bind_to_unit(1);
        assert_eq!(device.texture_on_unit(1), Some(texture.id()));

        drop(texture);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_modify_data_uploads_region() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let image = DecodedImage::solid(4, 4, [0, 0, 0, 255]);
        let texture = Texture2D::from_image(&gpu, &image, false, Path::new("canvas")).unwrap();
        device.take_commands();

        texture
            .modify_data(UVec2::new(1, 1), UVec2::new(2, 2), PixelFormat::Rgba, &[255; 16])
            .unwrap();

        assert!(device.commands().contains(&GpuCommand::TexSubImage2D {
            offset: UVec2::new(1, 1),
            size: UVec2::new(2, 2),
            format: PixelFormat::Rgba,
            bytes: 16,
        }));
    }

    #[test]
    fn test_short_pixel_data_rejected() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let image = DecodedImage {
            width: 64,
            height: 64,
            channels: 3,
            pixels: vec![0; 3],
        };
        let err = Texture2D::from_image(&gpu, &image, false, Path::new("short")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::PixelDataSize {
                expected: 12288,
                actual: 3
            }
        ));
        assert_eq!(device.live_textures(), 0);
        assert!(!device
            .commands()
            .iter()
            .any(|c| matches!(c, GpuCommand::TexImage2D { .. })));
    }

    #[test]
    fn test_short_region_data_rejected() {
        let device = Rc::new(HeadlessDevice::new());
        let gpu: Gpu = device.clone();

        let image = DecodedImage::solid(4, 4, [0, 0, 0, 255]);
        let texture = Texture2D::from_image(&gpu, &image, false, Path::new("canvas")).unwrap();
        device.take_commands();

        let result = texture.modify_data(UVec2::ZERO, UVec2::new(2, 2), PixelFormat::Rgb, &[255; 11]);
        assert!(matches!(
            result,
            Err(EngineError::PixelDataSize {
                expected: 12,
                actual: 11
            })
        ));
        assert!(device.commands().is_empty());
    }
}
