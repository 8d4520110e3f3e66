//! The Numerical Mechanism Contract
//!
//! Every mechanism perturbs a numeric query result so that neighbouring
//! datasets (differing in one record) produce indistinguishable outputs:
//!
//! ```text
//! P[M(D) ∈ S] ≤ e^ε · P[M(D') ∈ S] + δ
//! ```
//!
//! # Budget Splitting
//!
//! A call made with `privacy_budget = b` spends `ε · b` (and `δ · b` for the
//! Gaussian mechanism). Calls whose budgets sum to at most 1 together cost
//! no more than the mechanism's configured ε (basic composition).
//!
//! # Sharing
//!
//! Mechanisms are immutable once built. All randomness comes from the
//! caller's `rng`, so one mechanism can serve many threads at once.

use crate::confidence::ConfidenceInterval;
use crate::error::Result;
use crate::gaussian::GaussianMechanism;
use crate::laplace::LaplaceMechanism;
use rand::RngCore;

/// Capability shared by the Laplace and Gaussian mechanisms
pub trait NumericalMechanism: Send + Sync {
    /// Epsilon spent by a call at full budget
    fn epsilon(&self) -> f64;

    /// Add noise at full budget. Never fails for a finite `value`.
    fn add_noise(&self, value: f64, rng: &mut dyn RngCore) -> f64;

    /// Add noise spending `privacy_budget` ∈ (0, 1] of the mechanism's epsilon
    fn add_noise_with_budget(
        &self,
        value: f64,
        privacy_budget: f64,
        rng: &mut dyn RngCore,
    ) -> Result<f64>;

    /// Add noise to an integer query result, rounding the noised value
    fn add_noise_to_integer(&self, value: i64, rng: &mut dyn RngCore) -> i64 {
        self.add_noise(value as f64, rng).round() as i64
    }

    /// Interval around `noised_result` containing the true value with
    /// probability `confidence_level`, for noise added at `privacy_budget`
    fn noise_confidence_interval(
        &self,
        confidence_level: f64,
        privacy_budget: f64,
        noised_result: f64,
    ) -> Result<ConfidenceInterval>;

    /// One Bernoulli draw with success probability `P(value + noise > threshold)`
    ///
    /// The building block of sparse-vector / above-threshold algorithms; only
    /// the boolean outcome is revealed.
    fn noised_value_above_threshold(
        &self,
        value: f64,
        threshold: f64,
        rng: &mut dyn RngCore,
    ) -> bool;

    /// Variance of the noise added at full budget
    fn variance(&self) -> f64;
}

/// A built mechanism of either kind
///
/// Variant-specific accessors (sensitivity, delta, stddev) are reached by
/// matching, or through [`Mechanism::as_laplace`] / [`Mechanism::as_gaussian`].
#[derive(Debug, Clone)]
pub enum Mechanism {
    Laplace(LaplaceMechanism),
    Gaussian(GaussianMechanism),
}

impl Mechanism {
    pub fn as_laplace(&self) -> Option<&LaplaceMechanism> {
        match self {
            Mechanism::Laplace(m) => Some(m),
            Mechanism::Gaussian(_) => None,
        }
    }

    pub fn as_gaussian(&self) -> Option<&GaussianMechanism> {
        match self {
            Mechanism::Gaussian(m) => Some(m),
            Mechanism::Laplace(_) => None,
        }
    }

    fn inner(&self) -> &dyn NumericalMechanism {
        match self {
            Mechanism::Laplace(m) => m,
            Mechanism::Gaussian(m) => m,
        }
    }
}

impl NumericalMechanism for Mechanism {
    fn epsilon(&self) -> f64 {
        self.inner().epsilon()
    }

    fn add_noise(&self, value: f64, rng: &mut dyn RngCore) -> f64 {
        self.inner().add_noise(value, rng)
    }

    fn add_noise_with_budget(
        &self,
        value: f64,
        privacy_budget: f64,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        self.inner().add_noise_with_budget(value, privacy_budget, rng)
    }

    fn noise_confidence_interval(
        &self,
        confidence_level: f64,
        privacy_budget: f64,
        noised_result: f64,
    ) -> Result<ConfidenceInterval> {
        self.inner()
            .noise_confidence_interval(confidence_level, privacy_budget, noised_result)
    }

    fn noised_value_above_threshold(
        &self,
        value: f64,
        threshold: f64,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.inner().noised_value_above_threshold(value, threshold, rng)
    }

    fn variance(&self) -> f64 {
        self.inner().variance()
    }
}

impl From<LaplaceMechanism> for Mechanism {
    fn from(mechanism: LaplaceMechanism) -> Self {
        Mechanism::Laplace(mechanism)
    }
}

impl From<GaussianMechanism> for Mechanism {
    fn from(mechanism: GaussianMechanism) -> Self {
        Mechanism::Gaussian(mechanism)
    }
}
