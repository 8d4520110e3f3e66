//! Gaussian Mechanism for Differential Privacy
//!
//! Implements the Gaussian mechanism for achieving (ε, δ)-differential privacy.
//!
//! # Mathematical Foundation
//!
//! For a numeric query f with L2 sensitivity Δ₂f, the Gaussian mechanism
//! adds noise drawn from N(0, σ²):
//!
//! ```text
//! M(D) = f(D) + N(0, σ²)
//! ```
//!
//! # Analytic Calibration
//!
//! Rather than the classic bound σ ≥ Δ₂f · √(2 ln(1.25/δ)) / ε (valid only for
//! ε < 1), σ is the smallest value whose exact privacy loss satisfies the
//! target δ (Balle & Wang, 2018). With Δ₂f = 1, a = 1/(2σ) and b = εσ:
//!
//! ```text
//! δ(σ) = Φ(a - b) - e^ε · Φ(-a - b)
//! ```
//!
//! δ(σ) is decreasing in σ, so σ is found by doubling an upper bound and
//! then bisecting to a relative accuracy of 10⁻³. The result scales linearly
//! with Δ₂f.
//!
//! # Sensitivity Estimation
//!
//! Without an explicit L2 sensitivity it is bounded from L0 and LInf:
//!
//! ```text
//! Δ₂f ≤ √Δ₀f · Δ∞f
//! ```

use crate::builder::BaseParams;
use crate::confidence::ConfidenceInterval;
use crate::error::{MechanismError, Result};
use crate::mechanism::NumericalMechanism;
use crate::noise::{round_to_nearest_multiple, GaussianNoise, NoiseSource};
use crate::rng::uniform_double;
use crate::stats::{ln_normal_tail, normal_cdf, normal_quantile, standard_normal_cdf};
use crate::validation::{
    validate_confidence_level, validate_delta, validate_epsilon, validate_is_finite,
    validate_is_non_negative, validate_privacy_budget,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Relative accuracy of the calibrated standard deviation
const STDDEV_ACCURACY: f64 = 1e-3;

/// Builder for [`GaussianMechanism`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    epsilon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l0_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linf_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l2_sensitivity: Option<f64>,
}

impl GaussianBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn with_l0_sensitivity(mut self, l0_sensitivity: f64) -> Self {
        self.l0_sensitivity = Some(l0_sensitivity);
        self
    }

    pub fn with_linf_sensitivity(mut self, linf_sensitivity: f64) -> Self {
        self.linf_sensitivity = Some(linf_sensitivity);
        self
    }

    pub fn with_l2_sensitivity(mut self, l2_sensitivity: f64) -> Self {
        self.l2_sensitivity = Some(l2_sensitivity);
        self
    }

    pub fn epsilon(&self) -> Option<f64> {
        self.epsilon
    }

    pub fn delta(&self) -> Option<f64> {
        self.delta
    }

    /// Build with the default secure noise source
    pub fn build(&self) -> Result<GaussianMechanism> {
        self.build_with_source(GaussianNoise::new())
    }

    /// Build with a caller-provided noise source
    pub fn build_with_source<S: NoiseSource>(&self, source: S) -> Result<GaussianMechanism<S>> {
        let mechanism = self.validate(source).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected Gaussian mechanism configuration");
        })?;

        tracing::debug!(
            epsilon = mechanism.epsilon,
            delta = mechanism.delta,
            l2_sensitivity = mechanism.l2_sensitivity,
            stddev = mechanism.stddev,
            "built Gaussian mechanism"
        );
        Ok(mechanism)
    }

    fn validate<S: NoiseSource>(&self, source: S) -> Result<GaussianMechanism<S>> {
        let base = BaseParams::validate(self.epsilon, self.l0_sensitivity, self.linf_sensitivity)?;
        let delta = validate_delta(self.delta)?;
        let l2_sensitivity =
            base.resolve_sensitivity(self.l2_sensitivity, "L2 sensitivity", |l0, linf| {
                l0.sqrt() * linf
            })?;

        let stddev = GaussianMechanism::calculate_stddev(base.epsilon, delta, l2_sensitivity);
        if !(stddev.is_finite() && stddev > 0.0) {
            return Err(MechanismError::InvalidConfiguration(format!(
                "The calculated standard deviation has to be positive and finite but is {}",
                stddev
            )));
        }

        Ok(GaussianMechanism {
            epsilon: base.epsilon,
            delta,
            l2_sensitivity,
            stddev,
            source,
        })
    }
}

/// Gaussian mechanism for (ε, δ)-differential privacy
#[derive(Debug, Clone)]
pub struct GaussianMechanism<S = GaussianNoise> {
    epsilon: f64,
    delta: f64,
    l2_sensitivity: f64,
    stddev: f64,
    source: S,
}

impl GaussianMechanism {
    /// Construct directly from epsilon, delta and L2 sensitivity
    ///
    /// A sensitivity of 0 is accepted and yields an identity mechanism.
    pub fn new(epsilon: f64, delta: f64, l2_sensitivity: f64) -> Result<Self> {
        Self::with_source(epsilon, delta, l2_sensitivity, GaussianNoise::new())
    }

    pub fn builder() -> GaussianBuilder {
        GaussianBuilder::new()
    }

    /// Smallest σ (to within a relative 10⁻³) for which Gaussian noise gives
    /// (ε, δ)-DP at the given L2 sensitivity
    ///
    /// Deterministic: the same inputs always give the bitwise same output.
    pub fn calculate_stddev(epsilon: f64, delta: f64, l2_sensitivity: f64) -> f64 {
        let mut lower: f64 = 0.0;
        let mut upper: f64 = 1.0;

        while upper.is_finite() && privacy_loss_delta(epsilon, upper) > delta {
            lower = upper;
            upper *= 2.0;
        }

        while upper - lower > STDDEV_ACCURACY * lower {
            let middle = lower * 0.5 + upper * 0.5;
            if middle <= lower || middle >= upper {
                break;
            }
            if privacy_loss_delta(epsilon, middle) > delta {
                lower = middle;
            } else {
                upper = middle;
            }
        }

        upper * l2_sensitivity
    }
}

/// δ achieved by N(0, σ²) noise for a query of unit L2 sensitivity
///
/// The second term is formed in log space: e^ε overflows long before
/// Φ(-a - b) stops underflowing.
fn privacy_loss_delta(epsilon: f64, sigma: f64) -> f64 {
    let a = 1.0 / (2.0 * sigma);
    let b = epsilon * sigma;
    standard_normal_cdf(a - b) - (epsilon + ln_normal_tail(a + b)).exp()
}

impl<S: NoiseSource> GaussianMechanism<S> {
    pub fn with_source(epsilon: f64, delta: f64, l2_sensitivity: f64, source: S) -> Result<Self> {
        let epsilon = validate_epsilon(Some(epsilon))?;
        let delta = validate_delta(Some(delta))?;
        validate_is_finite(l2_sensitivity, "L2 sensitivity")?;
        validate_is_non_negative(l2_sensitivity, "L2 sensitivity")?;

        let stddev = GaussianMechanism::calculate_stddev(epsilon, delta, l2_sensitivity);
        if !stddev.is_finite() || (l2_sensitivity > 0.0 && stddev == 0.0) {
            return Err(MechanismError::InvalidConfiguration(format!(
                "The calculated standard deviation has to be positive and finite but is {}",
                stddev
            )));
        }
        Ok(GaussianMechanism {
            epsilon,
            delta,
            l2_sensitivity,
            stddev,
            source,
        })
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn l2_sensitivity(&self) -> f64 {
        self.l2_sensitivity
    }

    /// Standard deviation of the noise at full budget
    pub fn stddev(&self) -> f64 {
        self.stddev
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// σ for a call spending `privacy_budget`: calibrated to (ε·β, δ·β)
    fn stddev_for_budget(&self, privacy_budget: f64) -> Result<f64> {
        validate_privacy_budget(privacy_budget)?;
        if privacy_budget == 1.0 {
            return Ok(self.stddev);
        }

        let stddev = GaussianMechanism::calculate_stddev(
            self.epsilon * privacy_budget,
            self.delta * privacy_budget,
            self.l2_sensitivity,
        );
        if !stddev.is_finite() {
            return Err(MechanismError::InvalidArgument(format!(
                "privacy_budget {} is too small: the standard deviation is {}",
                privacy_budget, stddev
            )));
        }
        Ok(stddev)
    }

    fn perturb(&self, value: f64, stddev: f64, rng: &mut dyn RngCore) -> f64 {
        if stddev == 0.0 {
            return value;
        }
        let granularity = self.source.granularity(stddev);
        round_to_nearest_multiple(value, granularity) + self.source.sample(stddev, rng)
    }
}

impl<S: NoiseSource> NumericalMechanism for GaussianMechanism<S> {
    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn add_noise(&self, value: f64, rng: &mut dyn RngCore) -> f64 {
        self.perturb(value, self.stddev, rng)
    }

    fn add_noise_with_budget(
        &self,
        value: f64,
        privacy_budget: f64,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        let stddev = self.stddev_for_budget(privacy_budget)?;
        Ok(self.perturb(value, stddev, rng))
    }

    fn noise_confidence_interval(
        &self,
        confidence_level: f64,
        privacy_budget: f64,
        noised_result: f64,
    ) -> Result<ConfidenceInterval> {
        let stddev = self.stddev_for_budget(privacy_budget)?;
        validate_confidence_level(confidence_level)?;

        // Two-sided: half of 1 - level in each tail
        let bound = normal_quantile((1.0 - confidence_level) / 2.0) * stddev;
        Ok(ConfidenceInterval::new(
            noised_result + bound,
            noised_result - bound,
            confidence_level,
        ))
    }

    fn noised_value_above_threshold(
        &self,
        value: f64,
        threshold: f64,
        rng: &mut dyn RngCore,
    ) -> bool {
        if self.stddev == 0.0 {
            return value > threshold;
        }
        uniform_double(rng) > normal_cdf(self.stddev, threshold - value)
    }

    fn variance(&self) -> f64 {
        self.stddev * self.stddev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn message<T: std::fmt::Debug>(result: Result<T>) -> String {
        result.unwrap_err().message().to_string()
    }

    fn valid_builder() -> GaussianBuilder {
        GaussianBuilder::new().with_epsilon(1.0).with_delta(0.2)
    }

    #[test]
    fn test_calculate_stddev_reference_value() {
        let stddev = GaussianMechanism::calculate_stddev(3f64.ln(), 0.00001, 1.0);
        assert_eq!(stddev, 3.42578125);
    }

    #[test]
    fn test_calculate_stddev_is_deterministic() {
        let a = GaussianMechanism::calculate_stddev(0.7, 1e-6, 2.5);
        let b = GaussianMechanism::calculate_stddev(0.7, 1e-6, 2.5);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_calculate_stddev_scales_with_sensitivity() {
        let unit = GaussianMechanism::calculate_stddev(1.0, 1e-5, 1.0);
        let scaled = GaussianMechanism::calculate_stddev(1.0, 1e-5, 4.0);
        assert_eq!(scaled, 4.0 * unit);
    }

    #[test]
    fn test_calculate_stddev_meets_delta() {
        for (epsilon, delta) in [(0.1, 1e-5), (1.0, 1e-9), (5.0, 0.01)] {
            let stddev = GaussianMechanism::calculate_stddev(epsilon, delta, 1.0);
            assert!(privacy_loss_delta(epsilon, stddev) <= delta);
            // Not much larger than necessary
            assert!(privacy_loss_delta(epsilon, stddev * 0.99) > delta);
        }
    }

    #[test]
    fn test_smaller_delta_needs_more_noise() {
        let loose = GaussianMechanism::calculate_stddev(1.0, 1e-3, 1.0);
        let tight = GaussianMechanism::calculate_stddev(1.0, 1e-9, 1.0);
        assert!(tight > loose);
    }

    #[test]
    fn test_builder_fails_delta_not_set() {
        let result = GaussianBuilder::new()
            .with_l2_sensitivity(1.0)
            .with_epsilon(1.0)
            .build();
        assert!(matches!(result, Err(MechanismError::InvalidConfiguration(_))));
        assert!(message(result).starts_with("Delta has to be set"));
    }

    #[test]
    fn test_builder_fails_delta_nan() {
        let result = GaussianBuilder::new()
            .with_l2_sensitivity(1.0)
            .with_epsilon(1.0)
            .with_delta(f64::NAN)
            .build();
        assert!(message(result).starts_with("Delta has to be finite"));
    }

    #[test]
    fn test_builder_fails_delta_out_of_range() {
        for delta in [-1.0, 0.0, 1.0] {
            let result = GaussianBuilder::new()
                .with_l2_sensitivity(1.0)
                .with_epsilon(1.0)
                .with_delta(delta)
                .build();
            assert!(message(result).starts_with("Delta has to be in the interval"));
        }
    }

    #[test]
    fn test_builder_fails_l0_sensitivity_nan() {
        let result = valid_builder()
            .with_l0_sensitivity(f64::NAN)
            .with_linf_sensitivity(1.0)
            .build();
        assert!(message(result).starts_with("L0 sensitivity has to be finite"));
    }

    #[test]
    fn test_builder_fails_linf_sensitivity_infinity() {
        let result = valid_builder()
            .with_l0_sensitivity(1.0)
            .with_linf_sensitivity(f64::INFINITY)
            .build();
        assert!(message(result).starts_with("LInf sensitivity has to be finite"));
    }

    #[test]
    fn test_builder_fails_l2_sensitivity_nan() {
        let result = valid_builder().with_l2_sensitivity(f64::NAN).build();
        assert!(message(result).starts_with("L2 sensitivity has to be finite"));
    }

    #[test]
    fn test_builder_fails_calculated_l2_sensitivity_zero() {
        // sqrt(L0) * LInf underflows to 0
        let result = valid_builder()
            .with_l0_sensitivity(4.94065645841247e-323)
            .with_linf_sensitivity(5.24566986113514e-317)
            .build();
        assert!(message(result)
            .starts_with("The calculated L2 sensitivity has to be positive and finite"));
    }

    #[test]
    fn test_builder_derives_l2_from_l0_and_linf() {
        let mechanism = valid_builder()
            .with_l0_sensitivity(9.0)
            .with_linf_sensitivity(2.0)
            .build()
            .unwrap();
        assert_eq!(mechanism.l2_sensitivity(), 6.0);
    }

    #[test]
    fn test_builder_clone() {
        let builder = GaussianBuilder::new()
            .with_l2_sensitivity(1.2)
            .with_epsilon(1.1)
            .with_delta(0.5);
        let mechanism = builder.clone().build().unwrap();

        assert_eq!(mechanism.epsilon(), 1.1);
        assert_eq!(mechanism.delta(), 0.5);
        assert_eq!(mechanism.l2_sensitivity(), 1.2);
        assert_eq!(builder.delta(), Some(0.5));
    }

    #[test]
    fn test_adds_noise() {
        let mechanism = GaussianMechanism::new(1.0, 0.5, 1.0).unwrap();
        let mut rng = seeded(0);
        assert_ne!(mechanism.add_noise(1.0, &mut rng), 1.0);
        assert_ne!(mechanism.add_noise(1.1, &mut rng), 1.1);
        assert!(!mechanism.add_noise_with_budget(1.1, 0.5, &mut rng).unwrap().is_nan());
    }

    #[test]
    fn test_adds_noise_for_high_epsilon_and_low_delta() {
        let mechanism = GaussianBuilder::new()
            .with_l2_sensitivity(6.2324042213746395e-184)
            .with_delta(2.7161546250836291e-312)
            .with_epsilon(1.257239018692402e+232)
            .build()
            .unwrap();
        assert!(mechanism.stddev() > 0.0);

        let mut rng = seeded(1);
        let noised = mechanism.add_noise(5.0, &mut rng);
        assert!(noised.is_finite());
        assert!((noised - 5.0).abs() < 1e-290);
        assert!(mechanism.add_noise(f64::MAX, &mut rng).is_finite());
    }

    #[test]
    fn test_zero_sensitivity_is_identity() {
        let mechanism = GaussianMechanism::new(1.0, 1e-5, 0.0).unwrap();
        let mut rng = seeded(2);
        assert_eq!(mechanism.stddev(), 0.0);
        assert_eq!(mechanism.add_noise(12.3, &mut rng), 12.3);
        assert!(mechanism.noised_value_above_threshold(1.0, 0.5, &mut rng));
    }

    #[test]
    fn test_budget_out_of_range_is_rejected() {
        let mechanism = GaussianMechanism::new(1.0, 1e-5, 1.0).unwrap();
        let mut rng = seeded(3);
        for budget in [0.0, 2.0, f64::NAN] {
            let result = mechanism.add_noise_with_budget(1.0, budget, &mut rng);
            assert!(matches!(result, Err(MechanismError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_confidence_interval() {
        // (epsilon, delta, level, budget, result, expected bound)
        let cases = [
            (1.2, 0.3, 0.9, 0.5, 0.0, -1.9613),
            (1.0, 0.5, 0.95, 0.5, 1.3, -1.9054),
            (10.0, 0.5, 0.95, 0.75, 2.7, -0.5154),
        ];
        for (epsilon, delta, level, budget, result, bound) in cases {
            let mechanism = GaussianMechanism::new(epsilon, delta, 1.0).unwrap();
            let ci = mechanism.noise_confidence_interval(level, budget, result).unwrap();
            assert!((ci.lower_bound() - (result + bound)).abs() < 0.001);
            assert!((ci.upper_bound() - (result - bound)).abs() < 0.001);
            assert_eq!(ci.confidence_level(), level);
        }
    }

    #[test]
    fn test_confidence_interval_checks_budget_before_level() {
        let mechanism = GaussianMechanism::new(1.0, 0.5, 1.0).unwrap();
        let result = mechanism.noise_confidence_interval(f64::NAN, f64::NAN, 0.0);
        assert!(message(result).starts_with("privacy_budget has to be in"));

        let result = mechanism.noise_confidence_interval(1.0, 1.0, 0.0);
        assert!(message(result).starts_with("Confidence level has to be in"));
    }

    #[test]
    fn test_noised_value_above_threshold() {
        let mechanism = GaussianBuilder::new()
            .with_l2_sensitivity(1.0)
            .with_epsilon(1.0)
            .with_delta(0.5)
            .build()
            .unwrap();
        let mut rng = seeded(4);
        let trials = 100_000;

        // σ ≈ 0.5073 for (ε 1, δ 0.5)
        let scenarios = [
            (-0.5, -0.5, 0.5000),
            (0.5, -0.5, 0.9756),
            (-0.5, 0.0, 0.1622),
            (0.0, 0.5, 0.1622),
        ];
        for (value, threshold, expected) in scenarios {
            let above = (0..trials)
                .filter(|_| mechanism.noised_value_above_threshold(value, threshold, &mut rng))
                .count();
            let observed = above as f64 / trials as f64;
            assert!(
                (observed - expected).abs() < 0.006,
                "P(above) {} too far from {}",
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_huge_values_stay_finite() {
        let mechanism = GaussianMechanism::new(1.0, 1e-5, 1.0).unwrap();
        let mut rng = seeded(5);
        for value in [1e300, 1e308, f64::MAX, -f64::MAX] {
            let noised = mechanism.add_noise(value, &mut rng);
            assert!(noised.is_finite(), "noised {} became {}", value, noised);
        }
    }

    #[test]
    fn test_variance() {
        let mechanism = GaussianMechanism::new(3f64.ln(), 1e-5, 1.0).unwrap();
        assert_eq!(mechanism.variance(), 3.42578125 * 3.42578125);
    }
}
