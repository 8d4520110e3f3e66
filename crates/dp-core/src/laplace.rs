//! Laplace Mechanism for Differential Privacy
//!
//! Implements the classic Laplace mechanism for achieving (ε, 0)-differential privacy.
//!
//! # Mathematical Foundation
//!
//! For a numeric query f with L1 sensitivity Δf (the maximum change in f when
//! one record is added/removed), the Laplace mechanism adds noise drawn from
//! the Laplace distribution:
//!
//! ```text
//! M(D) = f(D) + Lap(0, Δf/ε)
//! ```
//!
//! The scale b = Δf/ε is called the *diversity*. Spending a fraction `β` of
//! the budget uses scale b/β.
//!
//! # Sensitivity Estimation
//!
//! When the L1 sensitivity is not known directly it is bounded from the L0
//! (number of coordinates one record can touch) and LInf (largest change per
//! coordinate) sensitivities:
//!
//! ```text
//! Δ₁f ≤ Δ₀f · Δ∞f
//! ```
//!
//! # Floating-Point Safety
//!
//! The noise comes from a [`NoiseSource`] on a power-of-two grid, and the
//! input is rounded onto the same grid before the noise is added, so the
//! output never carries low-order bits of the true value.

use crate::builder::BaseParams;
use crate::confidence::ConfidenceInterval;
use crate::error::{MechanismError, Result};
use crate::mechanism::NumericalMechanism;
use crate::noise::{round_to_nearest_multiple, LaplaceNoise, NoiseSource};
use crate::rng::uniform_double;
use crate::stats::laplace_cdf;
use crate::validation::{
    validate_confidence_level, validate_epsilon, validate_is_finite, validate_is_non_negative,
    validate_is_positive, validate_privacy_budget,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Largest accepted diversity (L1 sensitivity / epsilon)
pub const MAX_DIVERSITY: f64 = (1u64 << 50) as f64;

/// Builder for [`LaplaceMechanism`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaplaceBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    epsilon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l0_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linf_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    l1_sensitivity: Option<f64>,
}

impl LaplaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
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

    pub fn with_l1_sensitivity(mut self, l1_sensitivity: f64) -> Self {
        self.l1_sensitivity = Some(l1_sensitivity);
        self
    }

    pub fn epsilon(&self) -> Option<f64> {
        self.epsilon
    }

    pub fn l1_sensitivity(&self) -> Option<f64> {
        self.l1_sensitivity
    }

    /// Build with the default secure noise source
    pub fn build(&self) -> Result<LaplaceMechanism> {
        self.build_with_source(LaplaceNoise::new())
    }

    /// Build with a caller-provided noise source
    pub fn build_with_source<S: NoiseSource>(&self, source: S) -> Result<LaplaceMechanism<S>> {
        let (epsilon, l1_sensitivity, diversity) = self.validate().inspect_err(|e| {
            tracing::warn!(error = %e, "rejected Laplace mechanism configuration");
        })?;

        tracing::debug!(epsilon, l1_sensitivity, diversity, "built Laplace mechanism");
        Ok(LaplaceMechanism {
            epsilon,
            sensitivity: l1_sensitivity,
            diversity,
            source,
        })
    }

    fn validate(&self) -> Result<(f64, f64, f64)> {
        let base = BaseParams::validate(self.epsilon, self.l0_sensitivity, self.linf_sensitivity)?;
        let l1_sensitivity =
            base.resolve_sensitivity(self.l1_sensitivity, "L1 sensitivity", |l0, linf| l0 * linf)?;
        let diversity = l1_sensitivity / base.epsilon;
        validate_diversity(diversity)?;
        Ok((base.epsilon, l1_sensitivity, diversity))
    }
}

fn validate_diversity(diversity: f64) -> Result<()> {
    validate_is_positive(diversity, "The ratio of L1 sensitivity to epsilon")?;
    if !(diversity <= MAX_DIVERSITY) {
        return Err(MechanismError::InvalidConfiguration(format!(
            "The ratio of L1 sensitivity to epsilon has to be at most 2^50 but is {}",
            diversity
        )));
    }
    Ok(())
}

/// Laplace mechanism for (ε, 0)-differential privacy
#[derive(Debug, Clone)]
pub struct LaplaceMechanism<S = LaplaceNoise> {
    epsilon: f64,
    sensitivity: f64,
    diversity: f64,
    source: S,
}

impl LaplaceMechanism {
    /// Construct directly from epsilon and L1 sensitivity
    ///
    /// Unlike the builder this accepts a sensitivity of exactly 0, which
    /// yields a mechanism that returns every value unchanged.
    pub fn new(epsilon: f64, sensitivity: f64) -> Result<Self> {
        Self::with_source(epsilon, sensitivity, LaplaceNoise::new())
    }

    pub fn builder() -> LaplaceBuilder {
        LaplaceBuilder::new()
    }
}

impl<S: NoiseSource> LaplaceMechanism<S> {
    pub fn with_source(epsilon: f64, sensitivity: f64, source: S) -> Result<Self> {
        let epsilon = validate_epsilon(Some(epsilon))?;
        validate_is_finite(sensitivity, "L1 sensitivity")?;
        validate_is_non_negative(sensitivity, "L1 sensitivity")?;

        let diversity = sensitivity / epsilon;
        if sensitivity > 0.0 {
            validate_diversity(diversity)?;
        }
        Ok(LaplaceMechanism {
            epsilon,
            sensitivity,
            diversity,
            source,
        })
    }

    /// L1 sensitivity
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Scale of the noise at full budget: sensitivity / epsilon
    pub fn diversity(&self) -> f64 {
        self.diversity
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Noise scale for a call spending `privacy_budget`
    fn scale_for_budget(&self, privacy_budget: f64) -> Result<f64> {
        validate_privacy_budget(privacy_budget)?;
        let scale = self.diversity / privacy_budget;
        if !scale.is_finite() {
            return Err(MechanismError::InvalidArgument(format!(
                "privacy_budget {} is too small for diversity {}",
                privacy_budget, self.diversity
            )));
        }
        Ok(scale)
    }

    fn perturb(&self, value: f64, scale: f64, rng: &mut dyn RngCore) -> f64 {
        if self.diversity == 0.0 {
            return value;
        }
        let granularity = self.source.granularity(scale);
        round_to_nearest_multiple(value, granularity) + self.source.sample(scale, rng)
    }
}

impl<S: NoiseSource> NumericalMechanism for LaplaceMechanism<S> {
    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn add_noise(&self, value: f64, rng: &mut dyn RngCore) -> f64 {
        self.perturb(value, self.diversity, rng)
    }

    fn add_noise_with_budget(
        &self,
        value: f64,
        privacy_budget: f64,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        let scale = self.scale_for_budget(privacy_budget)?;
        Ok(self.perturb(value, scale, rng))
    }

    /// For Laplace noise P(|X| ≤ x) = 1 - e^(-x/b), so the half-width at
    /// level ℓ is -b · ln(1 - ℓ).
    fn noise_confidence_interval(
        &self,
        confidence_level: f64,
        privacy_budget: f64,
        noised_result: f64,
    ) -> Result<ConfidenceInterval> {
        let scale = self.scale_for_budget(privacy_budget)?;
        validate_confidence_level(confidence_level)?;

        let bound = (1.0 - confidence_level).ln() * scale;
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
        if self.diversity == 0.0 {
            return value > threshold;
        }
        uniform_double(rng) > laplace_cdf(self.diversity, threshold - value)
    }

    /// Var(Lap(0, b)) = 2b²
    fn variance(&self) -> f64 {
        2.0 * self.diversity * self.diversity
    }
}
