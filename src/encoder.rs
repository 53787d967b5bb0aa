//! Frame encoding.
//!
//! Turns a captured raster frame into PNG or JPEG bytes ready to be stored
//! in an archive.

use image::{
    DynamicImage,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};

use crate::{
    configuration::{DEFAULT_JPEG_QUALITY, ImageFormat},
    error::FramezipError,
};

/// Encode `frame` in `format`.
///
/// `quality` is only used for JPEG. Finite values are clamped into `[0, 1]`
/// and mapped onto the codec's 1–100 scale; non-finite values fall back to
/// [`DEFAULT_JPEG_QUALITY`]. JPEG output drops any alpha channel.
///
/// # Errors
///
/// Returns [`FramezipError::Encode`] if the codec rejects the frame.
///
/// # Example
///
/// ```
/// use framezip::{ImageFormat, encode};
/// use image::{DynamicImage, RgbImage};
///
/// let frame = DynamicImage::ImageRgb8(RgbImage::new(16, 9));
/// let png = encode(&frame, ImageFormat::Png, 0.0)?;
/// assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
/// # Ok::<(), framezip::FramezipError>(())
/// ```
pub fn encode(
    frame: &DynamicImage,
    format: ImageFormat,
    quality: f64,
) -> Result<Vec<u8>, FramezipError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Png => frame
            .write_with_encoder(PngEncoder::new(&mut bytes))
            .map_err(|error| FramezipError::Encode(format!("PNG: {error}")))?,
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality));
            DynamicImage::ImageRgb8(frame.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|error| FramezipError::Encode(format!("JPEG: {error}")))?;
        }
    }
    Ok(bytes)
}

/// Map a `[0, 1]` quality onto the JPEG codec's `1..=100` range.
pub fn jpeg_quality(quality: f64) -> u8 {
    let quality = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_JPEG_QUALITY
    };
    ((quality * 100.0).round() as u8).max(1)
}
