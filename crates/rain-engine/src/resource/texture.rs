use std::path::Path;

use thiserror::Error;

use crate::gfx::{GfxBackend, ImageDesc, ImageId, PixelFormat, Usage};

use super::decode::{DecodeError, DecodedImage, ImageDecoder};
use super::slot_map::{HandleKind, Resource};

/// Channel layout requested when loading an image file.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum TextureFormat {
    /// Keep whatever the file has.
    #[default]
    Unknown = 0,
    Grey = 1,
    GreyAlpha = 2,
    Rgb = 3,
    RgbAlpha = 4,
}

impl TextureFormat {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Grey),
            2 => Some(Self::GreyAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::RgbAlpha),
            _ => None,
        }
    }

    #[inline]
    pub const fn channels(self) -> u8 {
        self as u8
    }
}

/// Explicit texture description (render targets, depth buffers).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TextureDesc {
    pub render_target: bool,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
    pub format: PixelFormat,
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("unsupported texture: {0}")]
    Unsupported(String),
    #[error("no pixel format for {0} channels")]
    Channels(u8),
    #[error("GPU image creation failed for {width}x{height} {format:?}")]
    Gpu {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

/// One GPU image plus the metadata scripts can query.
///
/// A zeroed `Texture` (as returned by `Texture_Alloc`) has `exists == false`
/// and owns nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    pub exists: bool,
    pub image: ImageId,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: Usage,
    pub render_target: bool,
    pub sample_count: u32,
}

impl Resource for Texture {
    const KIND: HandleKind = HandleKind::Texture;
}

impl Texture {
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Creates an uninitialized image from `desc`, replacing any previous one.
    pub fn init(
        &mut self,
        gfx: &mut dyn GfxBackend,
        desc: &TextureDesc,
    ) -> Result<(), TextureError> {
        self.destroy(gfx);

        let mut image_desc = ImageDesc {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: Usage::Immutable,
            render_target: desc.render_target,
            sample_count: desc.sample_count,
            data: &[],
        };
        if let Some(reason) = image_desc.rejection() {
            return Err(TextureError::Unsupported(reason));
        }
        // Metadata reports the count the image really has.
        let sample_count = image_desc.resolved_sample_count();
        image_desc.sample_count = sample_count;

        let image = gfx.make_image(&image_desc);
        if !image.is_valid() {
            return Err(TextureError::Gpu {
                width: desc.width,
                height: desc.height,
                format: desc.format,
            });
        }

        *self = Texture {
            exists: true,
            image,
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: Usage::Immutable,
            render_target: desc.render_target,
            sample_count,
        };
        Ok(())
    }

    /// Decodes `path` and uploads it, replacing any previous image.
    ///
    /// On failure the texture is left empty (`exists == false`).
    pub fn load_file(
        &mut self,
        gfx: &mut dyn GfxBackend,
        decoder: &dyn ImageDecoder,
        path: &Path,
        format: TextureFormat,
        usage: Usage,
    ) -> Result<(), TextureError> {
        self.destroy(gfx);
        let decoded = decoder.decode_file(path, format.channels())?;
        self.upload(gfx, &decoded, usage)
    }

    /// Uploads already decoded pixels, replacing any previous image.
    pub fn upload(
        &mut self,
        gfx: &mut dyn GfxBackend,
        decoded: &DecodedImage,
        usage: Usage,
    ) -> Result<(), TextureError> {
        self.destroy(gfx);

        let format = PixelFormat::for_channels(decoded.channels)
            .ok_or(TextureError::Channels(decoded.channels))?;
        let image = gfx.make_image(&ImageDesc {
            width: decoded.width,
            height: decoded.height,
            format,
            usage,
            render_target: false,
            sample_count: 1,
            data: &decoded.pixels,
        });
        if !image.is_valid() {
            return Err(TextureError::Gpu {
                width: decoded.width,
                height: decoded.height,
                format,
            });
        }

        *self = Texture {
            exists: true,
            image,
            width: decoded.width,
            height: decoded.height,
            format,
            usage,
            render_target: false,
            sample_count: 1,
        };
        Ok(())
    }

    /// Releases the GPU image. The texture can be initialized again afterwards.
    pub fn destroy(&mut self, gfx: &mut dyn GfxBackend) {
        if self.image.is_valid() {
            gfx.destroy_image(self.image);
        }
        *self = Texture::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Call, RecordingBackend};

    fn pixels(width: u32, height: u32, channels: u8) -> DecodedImage {
        DecodedImage {
            pixels: vec![255; (width * height * u32::from(channels)) as usize],
            width,
            height,
            channels,
            source_channels: channels,
        }
    }

    #[test]
    fn init_records_descriptor() {
        let mut gfx = RecordingBackend::new();
        let mut tex = Texture::default();
        tex.init(
            &mut gfx,
            &TextureDesc {
                render_target: true,
                width: 320,
                height: 200,
                sample_count: 1,
                format: PixelFormat::Rgba8,
            },
        )
        .unwrap();

        assert!(tex.exists);
        assert!(tex.render_target);
        assert_eq!(tex.size(), (320, 200));
        assert_eq!(gfx.live_resources(), 1);
    }

    #[test]
    fn reinit_releases_previous_image() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let mut tex = Texture::default();
        tex.upload(&mut gfx, &pixels(2, 2, 4), Usage::Immutable).unwrap();
        let first = tex.image;
        tex.upload(&mut gfx, &pixels(4, 4, 1), Usage::Immutable).unwrap();

        assert_eq!(probe.count(|c| *c == Call::DestroyImage(first)), 1);
        assert_eq!(gfx.live_resources(), 1);
        assert_eq!(tex.format, PixelFormat::R8);
    }

    #[test]
    fn failed_init_leaves_texture_empty() {
        let mut gfx = RecordingBackend::new();
        let mut tex = Texture::default();
        let err = tex.init(&mut gfx, &TextureDesc::default()).unwrap_err();
        assert!(matches!(err, TextureError::Unsupported(_)));
        assert!(!tex.exists);
    }

    #[test]
    fn snorm_render_target_never_reaches_backend() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let mut tex = Texture::default();
        let desc = TextureDesc {
            render_target: true,
            width: 64,
            height: 64,
            sample_count: 1,
            format: PixelFormat::R8Snorm,
        };
        let err = tex.init(&mut gfx, &desc).unwrap_err();
        assert!(matches!(err, TextureError::Unsupported(_)));
        assert!(!tex.exists);
        assert_eq!(probe.count(|c| matches!(c, Call::MakeImage { .. })), 0);
    }

    #[test]
    fn sample_count_matches_created_image() {
        let mut gfx = RecordingBackend::new();
        let mut tex = Texture::default();
        let mut desc = TextureDesc {
            render_target: false,
            width: 16,
            height: 16,
            sample_count: 4,
            format: PixelFormat::Rgba8,
        };
        tex.init(&mut gfx, &desc).unwrap();
        assert_eq!(tex.sample_count, 1);

        desc.render_target = true;
        tex.init(&mut gfx, &desc).unwrap();
        assert_eq!(tex.sample_count, 4);

        desc.sample_count = 2;
        tex.init(&mut gfx, &desc).unwrap();
        assert_eq!(tex.sample_count, 1);
    }

    #[test]
    fn destroy_clears_exists() {
        let mut gfx = RecordingBackend::new();
        let mut tex = Texture::default();
        tex.upload(&mut gfx, &pixels(1, 1, 4), Usage::Immutable).unwrap();
        tex.destroy(&mut gfx);
        assert!(!tex.exists);
        assert_eq!(gfx.live_resources(), 0);
    }
}
