//! Photo Capture Layer
//!
//! Produces a [`CapturedImage`] from a user action. The only capture source
//! shipped with the CLI reads a photo file from disk; a device camera would
//! implement the same trait.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A captured odometer photo
///
/// Holds the encoded photo bytes as produced by the capture source. Decoding
/// happens later in the scan pipeline, so a corrupt file is still a valid
/// `CapturedImage` until preprocessing rejects it.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Encoded image bytes (PNG, JPEG, ...)
    pub data: Vec<u8>,
    /// Width in pixels as reported by the capture source
    pub width: u32,
    /// Height in pixels as reported by the capture source
    pub height: u32,
}

impl CapturedImage {
    /// Create a new captured image
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Get image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Source of captured photos (file picker, camera, ...)
pub trait CaptureSource {
    /// Produce one captured image. Failure means no scan session is started.
    fn capture(&self) -> Result<CapturedImage>;
}

/// Capture source backed by an image file on disk
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    /// Create a capture source for the given photo file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureSource for FileCapture {
    fn capture(&self) -> Result<CapturedImage> {
        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read photo: {}", self.path.display()))?;

        // Decode once to report dimensions; the scan pipeline decodes again
        // from the owned bytes.
        let decoded = image::load_from_memory(&data)
            .with_context(|| format!("Unrecognized image format: {}", self.path.display()))?;

        Ok(CapturedImage::new(data, decoded.width(), decoded.height()))
    }
}
