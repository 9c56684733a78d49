//! Odometer Scan Subsystem
//!
//! Turns a photographed odometer into a confirmed numeric kilometer reading:
//! the photo is preprocessed for OCR, handed to an external recognition
//! engine, and the recognized text is normalized, mined for numeric
//! candidates and disambiguated against the previously known reading. A
//! human confirmation step gates the final value.
//!
//! Everything except [`session::ScanSession`] is a stateless transformation.

pub mod extract;
pub mod normalize;
pub mod preprocess;
pub mod recognize;
pub mod resolve;
pub mod session;

pub use extract::{extract_candidates, Candidate};
pub use normalize::normalize_text;
pub use preprocess::{prepare_image, PreparedImage};
pub use recognize::{spawn_recognition, RecognitionEngine, RecognitionEvent};
pub use resolve::{resolve_reading, ReadingResolution};
pub use session::{ScanSession, ScanState};

use thiserror::Error;

/// Terminal scan failures
///
/// Each variant maps to a distinct user action: `Decode` and `Recognition`
/// ask for a new capture, `NoReadingFound` asks for a clearer photo or
/// manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The captured photo could not be decoded or processed
    #[error("could not decode captured photo: {0}")]
    Decode(String),

    /// The external recognition engine failed
    #[error("recognition engine failed: {0}")]
    Recognition(String),

    /// Recognition succeeded but produced no usable numeric candidate
    #[error("no odometer reading found in photo")]
    NoReadingFound,
}
