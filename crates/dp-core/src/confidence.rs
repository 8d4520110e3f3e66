//! Confidence Intervals for Mechanism Noise
//!
//! A [`ConfidenceInterval`] bounds the true (unnoised) value given a noised
//! result: it contains the true value with probability `confidence_level`.

use serde::{Deserialize, Serialize};

/// Immutable interval produced by
/// [`NumericalMechanism::noise_confidence_interval`](crate::NumericalMechanism::noise_confidence_interval)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    lower_bound: f64,
    upper_bound: f64,
    confidence_level: f64,
}

impl ConfidenceInterval {
    pub fn new(lower_bound: f64, upper_bound: f64, confidence_level: f64) -> Self {
        debug_assert!(lower_bound <= upper_bound, "lower bound above upper bound");
        ConfidenceInterval {
            lower_bound,
            upper_bound,
            confidence_level,
        }
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Whether `value` lies in the closed interval
    pub fn contains(&self, value: f64) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ci = ConfidenceInterval::new(-1.5, 2.5, 0.9);
        assert_eq!(ci.lower_bound(), -1.5);
        assert_eq!(ci.upper_bound(), 2.5);
        assert_eq!(ci.confidence_level(), 0.9);
        assert_eq!(ci.width(), 4.0);
    }

    #[test]
    fn test_contains_is_closed() {
        let ci = ConfidenceInterval::new(0.0, 1.0, 0.95);
        assert!(ci.contains(0.0));
        assert!(ci.contains(1.0));
        assert!(ci.contains(0.5));
        assert!(!ci.contains(-1e-9));
        assert!(!ci.contains(1.0 + 1e-9));
    }
}
