//! Numeric candidate extraction
//!
//! Pulls odometer-shaped numbers out of normalized recognition text.
//! The primary pass takes digit runs of typical odometer width; a fallback
//! pass accepts any decimal token when the primary pass finds nothing.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Digit runs of typical odometer width (3-7 digits)
const PRIMARY_PATTERN: &str = r"\d{3,7}";

/// Any decimal token; comma is treated as a decimal separator
const FALLBACK_PATTERN: &str = r"\d+[.,]?\d*";

fn primary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PRIMARY_PATTERN).expect("primary pattern compiles"))
}

fn fallback_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FALLBACK_PATTERN).expect("fallback pattern compiles"))
}

/// A numeric value parsed out of recognized text, before disambiguation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Parsed value
    pub value: f64,
    /// The substring it was parsed from
    pub source: String,
}

/// Extract candidates from normalized text, in order of appearance
///
/// An empty result is a normal outcome, not a fault: it means the photo
/// contained no numeric substring at all.
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = primary_regex()
        .find_iter(text)
        .filter_map(|m| {
            m.as_str().parse::<u32>().ok().map(|v| Candidate {
                value: v as f64,
                source: m.as_str().to_string(),
            })
        })
        .collect();

    if candidates.is_empty() {
        candidates = fallback_regex()
            .find_iter(text)
            .filter_map(|m| {
                m.as_str()
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .map(|v| Candidate {
                        value: v,
                        source: m.as_str().to_string(),
                    })
            })
            .collect();

        if !candidates.is_empty() {
            debug!("Primary pass empty, {} fallback candidates", candidates.len());
        }
    }

    candidates
}
