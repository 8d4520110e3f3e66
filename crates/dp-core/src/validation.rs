//! Input Validation for Mechanism Parameters
//!
//! Pure checks used by the builders (configuration errors) and by the
//! per-call operations (argument errors).
//!
//! # Parameter Constraints
//!
//! ## Epsilon (ε)
//! - Must be set, finite and positive (> 0)
//! - Smaller = more private, but more noise
//!
//! ## Delta (δ)
//! - Gaussian mechanism only
//! - Must be set, finite and strictly inside (0, 1)
//!
//! ## Sensitivities (L0, LInf, L1, L2)
//! - Must be finite and positive when supplied
//!
//! ## Privacy budget
//! - Fraction of the mechanism's epsilon spent by one call, in (0, 1]
//!
//! ## Confidence level
//! - Strictly inside (0, 1)
//!
//! Messages are stable: callers match on their prefixes.

use crate::error::{MechanismError, Result};

/// Returns the value if present, otherwise `"<name> has to be set"`
pub fn validate_is_set(value: Option<f64>, name: &str) -> Result<f64> {
    value.ok_or_else(|| MechanismError::InvalidConfiguration(format!("{} has to be set", name)))
}

pub fn validate_is_finite(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(MechanismError::InvalidConfiguration(format!(
            "{} has to be finite but is {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_is_positive(value: f64, name: &str) -> Result<()> {
    if !(value > 0.0) {
        return Err(MechanismError::InvalidConfiguration(format!(
            "{} has to be positive but is {}",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_is_non_negative(value: f64, name: &str) -> Result<()> {
    if !(value >= 0.0) {
        return Err(MechanismError::InvalidConfiguration(format!(
            "{} has to be non-negative but is {}",
            name, value
        )));
    }
    Ok(())
}

/// Set, finite and positive, in that order
pub fn validate_is_set_finite_positive(value: Option<f64>, name: &str) -> Result<f64> {
    let value = validate_is_set(value, name)?;
    validate_is_finite(value, name)?;
    validate_is_positive(value, name)?;
    Ok(value)
}

/// Validate epsilon
///
/// # Constraints
/// - Must be set
/// - Must be finite
/// - Must be positive (> 0)
pub fn validate_epsilon(epsilon: Option<f64>) -> Result<f64> {
    validate_is_set_finite_positive(epsilon, "Epsilon")
}

/// Validate delta for the Gaussian mechanism
///
/// # Constraints
/// - Must be set
/// - Must be finite
/// - Must be in (0, 1); δ = 0 would be pure ε-DP, which Gaussian noise
///   cannot provide
pub fn validate_delta(delta: Option<f64>) -> Result<f64> {
    let delta = validate_is_set(delta, "Delta")?;
    validate_is_finite(delta, "Delta")?;
    if !(delta > 0.0 && delta < 1.0) {
        return Err(MechanismError::InvalidConfiguration(format!(
            "Delta has to be in the interval (0, 1) but is {}",
            delta
        )));
    }
    Ok(delta)
}

/// Validate a sensitivity that may be absent
///
/// Returns `Ok(None)` when unset; otherwise the value must be finite and
/// positive.
pub fn validate_optional_sensitivity(value: Option<f64>, name: &str) -> Result<Option<f64>> {
    match value {
        None => Ok(None),
        Some(v) => {
            validate_is_finite(v, name)?;
            validate_is_positive(v, name)?;
            Ok(Some(v))
        }
    }
}

/// Validate the fraction of the privacy budget spent by a single call
pub fn validate_privacy_budget(privacy_budget: f64) -> Result<()> {
    if !(privacy_budget > 0.0 && privacy_budget <= 1.0) {
        return Err(MechanismError::InvalidArgument(format!(
            "privacy_budget has to be in the interval (0, 1] but is {}",
            privacy_budget
        )));
    }
    Ok(())
}

/// Validate the confidence level of a noise confidence interval
pub fn validate_confidence_level(confidence_level: f64) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(MechanismError::InvalidArgument(format!(
            "Confidence level has to be in the interval (0, 1) but is {}",
            confidence_level
        )));
    }
    Ok(())
}
