//! Image preprocessing for OCR
//!
//! Normalizes a captured photo into a form friendlier to the recognition
//! engine: bounded resize, grayscale conversion and a linear contrast
//! stretch. The transform is deterministic so the same capture always
//! yields a byte-identical prepared image.

use anyhow::Context;
use image::imageops::FilterType;
use std::io::Cursor;
use tracing::debug;

use super::ScanError;
use crate::capture::CapturedImage;

/// Longest edge of a prepared image; larger photos are scaled down,
/// smaller ones are never upscaled.
pub const MAX_DIMENSION: u32 = 1200;

/// Gain of the linear contrast stretch around mid-gray.
const CONTRAST_GAIN: f32 = 1.5;

/// Grayscale, contrast-adjusted pixel buffer derived from a capture
///
/// One byte per pixel, row-major. Never mutated after creation; consumed
/// once by the recognition adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Luma pixel data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PreparedImage {
    /// Encode the buffer as PNG, the interchange format expected by
    /// engine bindings that take encoded images.
    pub fn to_png_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let img = image::GrayImage::from_raw(self.width, self.height, self.data.clone())
            .context("Prepared image buffer does not match its dimensions")?;

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .context("Failed to encode prepared image")?;
        Ok(bytes)
    }
}

/// Prepare a captured photo for recognition
///
/// An unreadable or corrupt capture is reported as [`ScanError::Decode`];
/// any structurally valid image succeeds.
pub fn prepare_image(captured: &CapturedImage) -> Result<PreparedImage, ScanError> {
    let decoded = image::load_from_memory(&captured.data)
        .map_err(|e| ScanError::Decode(e.to_string()))?;

    let (orig_w, orig_h) = (decoded.width(), decoded.height());

    // Bounded resize: cap the longer edge, keep aspect, never upscale
    let resized = if orig_w.max(orig_h) > MAX_DIMENSION {
        decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut data = Vec::with_capacity((width * height) as usize);
    for pixel in rgb.pixels() {
        // Standard luminance weights
        let gray =
            (0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32) as u8;

        // Contrast around midpoint (128)
        let adjusted = ((gray as f32 - 128.0) * CONTRAST_GAIN + 128.0).clamp(0.0, 255.0);
        data.push(adjusted as u8);
    }

    debug!(
        "Prepared image: {}x{} -> {}x{}",
        orig_w, orig_h, width, height
    );

    Ok(PreparedImage {
        data,
        width,
        height,
    })
}
