//! Image decoding into channel stacks.
//!
//! Grayscale files (8- or 16-bit) become single-channel stacks; color
//! files contribute one channel per color plane (alpha is dropped).
//! Samples are normalized to `[0, 1]` so 8- and 16-bit sources measure
//! on the same scale.
//!
//! Decode failures surface as typed errors — a bad file never silently
//! turns into an all-zero stack.

use std::path::Path;

use image::DynamicImage;
use saibou_pipeline::{ChannelStack, Luma32FImage, SegmentationError};

/// Errors that can occur while loading images or writing results.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Reading or writing a file failed.
    #[error("file access failed: {0}")]
    File(#[from] std::io::Error),

    /// An image codec failed: unrecognized format, corrupt data, or a
    /// failed encode on the way out.
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// The decoded data did not form a valid channel stack.
    #[error(transparent)]
    Shape(#[from] SegmentationError),
}

/// Load an image file into a [`ChannelStack`].
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be read,
/// [`IoError::Codec`] if it cannot be decoded, and [`IoError::Shape`]
/// if the decoded data is degenerate (e.g. zero-sized).
pub fn load_channels(path: &Path) -> Result<ChannelStack, IoError> {
    let bytes = std::fs::read(path)?;
    decode_channels(&bytes)
}

/// Decode in-memory image bytes into a [`ChannelStack`].
///
/// # Errors
///
/// Returns [`IoError::Codec`] for unrecognized or corrupt data and
/// [`IoError::Shape`] for degenerate decoded shapes.
pub fn decode_channels(bytes: &[u8]) -> Result<ChannelStack, IoError> {
    let decoded = image::load_from_memory(bytes)?;
    let channels = match decoded {
        DynamicImage::ImageLuma8(gray) => {
            vec![Luma32FImage::from_fn(gray.width(), gray.height(), |x, y| {
                image::Luma([f32::from(gray.get_pixel(x, y).0[0]) / 255.0])
            })]
        }
        DynamicImage::ImageLumaA8(gray) => {
            vec![Luma32FImage::from_fn(gray.width(), gray.height(), |x, y| {
                image::Luma([f32::from(gray.get_pixel(x, y).0[0]) / 255.0])
            })]
        }
        DynamicImage::ImageLuma16(gray) => {
            vec![Luma32FImage::from_fn(gray.width(), gray.height(), |x, y| {
                image::Luma([f32::from(gray.get_pixel(x, y).0[0]) / 65535.0])
            })]
        }
        DynamicImage::ImageLumaA16(gray) => {
            vec![Luma32FImage::from_fn(gray.width(), gray.height(), |x, y| {
                image::Luma([f32::from(gray.get_pixel(x, y).0[0]) / 65535.0])
            })]
        }
        other => {
            // Color input: one channel per color plane, alpha dropped.
            let rgb = other.to_rgb32f();
            (0..3)
                .map(|c| {
                    Luma32FImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                        image::Luma([rgb.get_pixel(x, y).0[c]])
                    })
                })
                .collect()
        }
    };
    Ok(ChannelStack::from_channels(channels)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::ImageEncoder;

    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        buf
    }

    #[test]
    fn corrupt_bytes_are_a_decode_error() {
        let result = decode_channels(&[0xFF, 0x00, 0x12]);
        assert!(matches!(result, Err(IoError::Codec(_))));
    }

    #[test]
    fn grayscale_png_becomes_one_channel() {
        let gray = image::GrayImage::from_fn(6, 4, |x, _y| image::Luma([(x * 40) as u8]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(gray.as_raw(), 6, 4, image::ExtendedColorType::L8)
            .unwrap();

        let stack = decode_channels(&buf).unwrap();
        assert_eq!(stack.channel_count(), 1);
        assert_eq!(stack.dimensions().width, 6);
        let value = stack.channel(0).unwrap().get_pixel(2, 0).0[0];
        assert!((value - 80.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn color_png_becomes_three_channels() {
        let img = image::RgbaImage::from_fn(5, 5, |_, _| image::Rgba([255, 0, 128, 255]));
        let stack = decode_channels(&encode_png(&img)).unwrap();
        assert_eq!(stack.channel_count(), 3);
        let red = stack.channel(0).unwrap().get_pixel(2, 2).0[0];
        let green = stack.channel(1).unwrap().get_pixel(2, 2).0[0];
        assert!(red > 0.99, "red channel should be ~1.0, got {red}");
        assert!(green < 0.01, "green channel should be ~0.0, got {green}");
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let result = load_channels(Path::new("/nonexistent/input.tif"));
        assert!(matches!(result, Err(IoError::File(_))));
    }
}
