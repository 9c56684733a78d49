//! Reading disambiguation
//!
//! Picks the single best odometer candidate from a scan, optionally biased
//! by the previously recorded reading, and ranks the remainder as
//! alternatives. Pure function of its inputs.
//!
//! Policy: candidates inside the typical odometer window win over noise.
//! With a prior reading the smallest candidate at or above it is chosen,
//! since an odometer moves up in small increments; if every candidate sits
//! below the prior, the largest one wins on the assumption that either the
//! prior or the current read misfired on a digit. Without a prior the
//! largest candidate wins. That last rule can misfire on trip counters or
//! clocks photographed next to the odometer; a change of policy here must
//! be deliberate, not incidental.

use tracing::debug;

use super::extract::Candidate;

/// Typical odometer window: values outside are treated as noise
pub const PLAUSIBLE_MIN: f64 = 1000.0;
/// Upper bound of the typical odometer window
pub const PLAUSIBLE_MAX: f64 = 999_999.0;

/// Alternatives shown to the user, at most
pub const MAX_ALTERNATIVES: usize = 5;

/// Outcome of disambiguating one scan's candidates
///
/// When `alternatives` is non-empty, `best` is always set and its value
/// never appears among the alternatives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadingResolution {
    /// The selected reading, if any candidate survived
    pub best: Option<f64>,
    /// Remaining candidate values in extraction order
    pub alternatives: Vec<f64>,
    /// The prior reading this resolution was biased by
    pub reference: Option<f64>,
}

impl ReadingResolution {
    /// True if the value was offered by this resolution (best or alternative)
    pub fn offers(&self, value: f64) -> bool {
        self.best == Some(value) || self.alternatives.contains(&value)
    }
}

/// Resolve a candidate list into a reading
pub fn resolve_reading(candidates: &[Candidate], reference: Option<f64>) -> ReadingResolution {
    if candidates.is_empty() {
        return ReadingResolution {
            best: None,
            alternatives: Vec::new(),
            reference,
        };
    }

    let values: Vec<f64> = candidates.iter().map(|c| c.value).collect();

    let plausible: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| (PLAUSIBLE_MIN..=PLAUSIBLE_MAX).contains(v))
        .collect();

    // Degraded path: no candidate in the odometer window, operate on the
    // full set instead
    let working: &[f64] = if plausible.is_empty() {
        &values
    } else {
        &plausible
    };

    let reference_km = reference.unwrap_or(0.0);

    let best = if reference_km > 0.0 {
        // An odometer only increases: prefer the smallest candidate at or
        // above the prior reading
        let smallest_valid = working
            .iter()
            .copied()
            .filter(|v| *v >= reference_km)
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            });

        match smallest_valid {
            Some(v) => v,
            // Every candidate is below the prior: one of the two readings
            // misread a digit, trust the larger digit run
            None => {
                debug!(
                    "All candidates below reference {}, taking largest",
                    reference_km
                );
                max_of(working)
            }
        }
    } else {
        max_of(working)
    };

    let alternatives: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v != best)
        .take(MAX_ALTERNATIVES)
        .collect();

    ReadingResolution {
        best: Some(best),
        alternatives,
        reference,
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MIN, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(values: &[f64]) -> Vec<Candidate> {
        values
            .iter()
            .map(|&v| Candidate {
                value: v,
                source: v.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_empty_input_law() {
        let resolution = resolve_reading(&[], Some(4600.0));
        assert_eq!(resolution.best, None);
        assert!(resolution.alternatives.is_empty());
    }

    #[test]
    fn test_no_reference_takes_largest_plausible() {
        let resolution = resolve_reading(&candidates(&[12345.0, 4800.0]), None);
        assert_eq!(resolution.best, Some(12345.0));
    }

    #[test]
    fn test_zero_reference_treated_as_absent() {
        let resolution = resolve_reading(&candidates(&[4521.0, 4800.0]), Some(0.0));
        assert_eq!(resolution.best, Some(4800.0));
    }

    #[test]
    fn test_monotonic_reference_law() {
        // Smallest candidate at or above the reference wins
        let resolution = resolve_reading(&candidates(&[4800.0, 4650.0, 9999.0]), Some(4600.0));
        assert_eq!(resolution.best, Some(4650.0));
    }

    #[test]
    fn test_reference_excludes_lower_candidates() {
        // 4521 < 4600 is excluded from "valid" but stays an alternative
        let resolution = resolve_reading(&candidates(&[4521.0, 4800.0]), Some(4600.0));
        assert_eq!(resolution.best, Some(4800.0));
        assert_eq!(resolution.alternatives, vec![4521.0]);
    }

    #[test]
    fn test_all_below_reference_takes_largest() {
        let resolution = resolve_reading(&candidates(&[4521.0, 4300.0]), Some(9000.0));
        assert_eq!(resolution.best, Some(4521.0));
    }

    #[test]
    fn test_noise_outside_window_filtered() {
        // 150 and 7000000 are outside [1000, 999999]
        let resolution = resolve_reading(&candidates(&[150.0, 45678.0, 7_000_000.0]), None);
        assert_eq!(resolution.best, Some(45678.0));
    }

    #[test]
    fn test_degraded_path_without_reference() {
        // Nothing plausible: operate on the full set
        let resolution = resolve_reading(&candidates(&[99.0]), None);
        assert_eq!(resolution.best, Some(99.0));
    }

    #[test]
    fn test_degraded_path_with_reference() {
        let resolution = resolve_reading(&candidates(&[99.0, 45.0]), Some(50.0));
        assert_eq!(resolution.best, Some(99.0));

        // Reference above everything: largest of the working set
        let resolution = resolve_reading(&candidates(&[99.0, 45.0]), Some(150.0));
        assert_eq!(resolution.best, Some(99.0));
    }

    #[test]
    fn test_alternatives_exclude_best() {
        let resolution = resolve_reading(&candidates(&[4800.0, 4521.0, 4800.0]), None);
        assert_eq!(resolution.best, Some(4800.0));
        assert_eq!(resolution.alternatives, vec![4521.0]);
        assert!(!resolution.alternatives.contains(&4800.0));
    }

    #[test]
    fn test_alternatives_capped_and_ordered() {
        let many: Vec<f64> = (1..=8).map(|i| 1000.0 * i as f64).collect();
        let resolution = resolve_reading(&candidates(&many), None);

        assert_eq!(resolution.best, Some(8000.0));
        assert_eq!(
            resolution.alternatives,
            vec![1000.0, 2000.0, 3000.0, 4000.0, 5000.0]
        );
    }

    #[test]
    fn test_determinism() {
        let set = candidates(&[4521.0, 4800.0, 99.0, 123456.0]);
        let a = resolve_reading(&set, Some(4600.0));
        let b = resolve_reading(&set, Some(4600.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_offers() {
        let resolution = resolve_reading(&candidates(&[4521.0, 4800.0]), Some(4600.0));
        assert!(resolution.offers(4800.0));
        assert!(resolution.offers(4521.0));
        assert!(!resolution.offers(5000.0));
    }
}
