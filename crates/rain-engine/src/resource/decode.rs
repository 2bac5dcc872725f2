use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode '{origin}': {reason}")]
    Decode { origin: String, reason: String },
    #[error("unsupported channel count {0}")]
    Channels(u8),
}

/// Decoded 8-bit pixels, bottom row first.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per pixel in `pixels`: 1, 2 or 4 (three-channel requests are padded to 4).
    pub channels: u8,
    /// Channel count of the file itself.
    pub source_channels: u8,
}

/// Image decoding seam used by `Texture::load_file`.
///
/// `channels` 0 keeps the file's own channel count.
pub trait ImageDecoder {
    fn decode_file(&self, path: &Path, channels: u8) -> Result<DecodedImage, DecodeError>;
}

/// `ImageDecoder` backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode_file(&self, path: &Path, channels: u8) -> Result<DecodedImage, DecodeError> {
        let img = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(source) => DecodeError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => DecodeError::Decode {
                origin: path.display().to_string(),
                reason: other.to_string(),
            },
        })?;
        to_pixels(img, channels)
    }
}

fn to_pixels(img: DynamicImage, requested: u8) -> Result<DecodedImage, DecodeError> {
    let source_channels = img.color().channel_count();
    let wanted = if requested == 0 { source_channels } else { requested };

    // GPU texture rows start at the bottom of the picture.
    let img = img.flipv();
    let (width, height) = (img.width(), img.height());

    let (pixels, channels) = match wanted {
        1 => (img.to_luma8().into_raw(), 1),
        2 => (img.to_luma_alpha8().into_raw(), 2),
        3 | 4 => (img.to_rgba8().into_raw(), 4),
        n => return Err(DecodeError::Channels(n)),
    };

    Ok(DecodedImage {
        pixels,
        width,
        height,
        channels,
        source_channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_png(dir: &Path) -> PathBuf {
        let img = image::RgbaImage::from_fn(2, 2, |_, y| match y {
            0 => image::Rgba([255, 0, 0, 255]),
            _ => image::Rgba([0, 0, 255, 255]),
        });
        let path = dir.join("rows.png");
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn decode_flips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_row_png(dir.path());
        let decoded = ImageCrateDecoder.decode_file(&path, 4).unwrap();

        assert_eq!((decoded.width, decoded.height, decoded.channels), (2, 2, 4));
        // First row in memory is the picture's bottom (blue) row.
        assert_eq!(&decoded.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&decoded.pixels[8..12], &[255, 0, 0, 255]);
    }

    #[test]
    fn zero_channels_keeps_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_row_png(dir.path());
        let decoded = ImageCrateDecoder.decode_file(&path, 0).unwrap();
        assert_eq!(decoded.source_channels, 4);
        assert_eq!(decoded.channels, 4);
    }

    #[test]
    fn grey_request_gives_one_byte_per_pixel() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_row_png(dir.path());
        let decoded = ImageCrateDecoder.decode_file(&path, 1).unwrap();
        assert_eq!(decoded.pixels.len(), 4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageCrateDecoder
            .decode_file(&dir.path().join("nope.png"), 4)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn garbage_file_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = ImageCrateDecoder.decode_file(&path, 4).unwrap_err();
        assert!(matches!(err, DecodeError::Decode { .. }));
    }
}
