//! Mechanism Builders
//!
//! Builders are plain value structs: every setter consumes the builder and
//! returns the updated copy, and `clone()` is a bitwise copy, so alternative
//! configurations can branch from a shared baseline without aliasing.
//!
//! Validation happens in one pure step at `build()` time, in this order:
//! 1. epsilon (set, finite, positive)
//! 2. L0 sensitivity, then LInf sensitivity (finite, positive when set; both
//!    or neither)
//! 3. delta (Gaussian only)
//! 4. the sensitivity the mechanism uses, explicit or derived from L0/LInf
//! 5. mechanism-specific checks on the derived noise scale
//!
//! [`MechanismBuilder`] selects the mechanism kind at runtime and is the
//! deserialization target for configuration files:
//!
//! ```
//! use dp_core::{MechanismBuilder, NumericalMechanism};
//!
//! let builder: MechanismBuilder = serde_json::from_str(
//!     r#"{"mechanism": "laplace", "epsilon": 1.0, "l1_sensitivity": 2.0}"#,
//! ).unwrap();
//! let mechanism = builder.build().unwrap();
//! assert_eq!(mechanism.epsilon(), 1.0);
//! ```

use crate::error::{MechanismError, Result};
use crate::gaussian::GaussianBuilder;
use crate::laplace::LaplaceBuilder;
use crate::mechanism::Mechanism;
use crate::validation::{
    validate_epsilon, validate_is_finite, validate_is_positive, validate_optional_sensitivity,
};
use serde::{Deserialize, Serialize};

/// Parameters common to every builder, after validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BaseParams {
    pub epsilon: f64,
    pub l0_sensitivity: Option<f64>,
    pub linf_sensitivity: Option<f64>,
}

impl BaseParams {
    /// Steps 1 and 2 of the validation order
    pub fn validate(
        epsilon: Option<f64>,
        l0_sensitivity: Option<f64>,
        linf_sensitivity: Option<f64>,
    ) -> Result<Self> {
        let epsilon = validate_epsilon(epsilon)?;
        let l0_sensitivity = validate_optional_sensitivity(l0_sensitivity, "L0 sensitivity")?;
        let linf_sensitivity = validate_optional_sensitivity(linf_sensitivity, "LInf sensitivity")?;

        match (l0_sensitivity, linf_sensitivity) {
            (Some(_), None) => Err(MechanismError::InvalidConfiguration(
                "LInf sensitivity has to be set if L0 sensitivity is set".to_string(),
            )),
            (None, Some(_)) => Err(MechanismError::InvalidConfiguration(
                "L0 sensitivity has to be set if LInf sensitivity is set".to_string(),
            )),
            _ => Ok(BaseParams {
                epsilon,
                l0_sensitivity,
                linf_sensitivity,
            }),
        }
    }

    /// Use the explicit sensitivity, or derive it from L0 and LInf
    ///
    /// A derived value that underflows to zero or overflows is rejected:
    /// it would either remove all noise or produce NaN later.
    pub fn resolve_sensitivity(
        &self,
        explicit: Option<f64>,
        name: &str,
        combine: fn(f64, f64) -> f64,
    ) -> Result<f64> {
        if let Some(sensitivity) = explicit {
            validate_is_finite(sensitivity, name)?;
            validate_is_positive(sensitivity, name)?;
            return Ok(sensitivity);
        }

        match (self.l0_sensitivity, self.linf_sensitivity) {
            (Some(l0), Some(linf)) => {
                let derived = combine(l0, linf);
                if !(derived.is_finite() && derived > 0.0) {
                    return Err(MechanismError::InvalidConfiguration(format!(
                        "The calculated {} has to be positive and finite but is {}",
                        name, derived
                    )));
                }
                Ok(derived)
            }
            _ => Err(MechanismError::InvalidConfiguration(format!(
                "{} has to be set or both L0 and LInf sensitivities have to be set",
                name
            ))),
        }
    }
}

/// Builder for either mechanism kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mechanism", rename_all = "snake_case")]
pub enum MechanismBuilder {
    Laplace(LaplaceBuilder),
    Gaussian(GaussianBuilder),
}

impl MechanismBuilder {
    pub fn laplace() -> Self {
        MechanismBuilder::Laplace(LaplaceBuilder::new())
    }

    pub fn gaussian() -> Self {
        MechanismBuilder::Gaussian(GaussianBuilder::new())
    }

    pub fn with_epsilon(self, epsilon: f64) -> Self {
        match self {
            MechanismBuilder::Laplace(b) => MechanismBuilder::Laplace(b.with_epsilon(epsilon)),
            MechanismBuilder::Gaussian(b) => MechanismBuilder::Gaussian(b.with_epsilon(epsilon)),
        }
    }

    pub fn with_l0_sensitivity(self, l0_sensitivity: f64) -> Self {
        match self {
            MechanismBuilder::Laplace(b) => {
                MechanismBuilder::Laplace(b.with_l0_sensitivity(l0_sensitivity))
            }
            MechanismBuilder::Gaussian(b) => {
                MechanismBuilder::Gaussian(b.with_l0_sensitivity(l0_sensitivity))
            }
        }
    }

    pub fn with_linf_sensitivity(self, linf_sensitivity: f64) -> Self {
        match self {
            MechanismBuilder::Laplace(b) => {
                MechanismBuilder::Laplace(b.with_linf_sensitivity(linf_sensitivity))
            }
            MechanismBuilder::Gaussian(b) => {
                MechanismBuilder::Gaussian(b.with_linf_sensitivity(linf_sensitivity))
            }
        }
    }

    /// Delta for the Gaussian kind; leaves a Laplace builder unchanged
    pub fn with_delta(self, delta: f64) -> Self {
        match self {
            MechanismBuilder::Gaussian(b) => MechanismBuilder::Gaussian(b.with_delta(delta)),
            laplace => laplace,
        }
    }

    /// L1 sensitivity for the Laplace kind; leaves a Gaussian builder unchanged
    pub fn with_l1_sensitivity(self, l1_sensitivity: f64) -> Self {
        match self {
            MechanismBuilder::Laplace(b) => {
                MechanismBuilder::Laplace(b.with_l1_sensitivity(l1_sensitivity))
            }
            gaussian => gaussian,
        }
    }

    /// L2 sensitivity for the Gaussian kind; leaves a Laplace builder unchanged
    pub fn with_l2_sensitivity(self, l2_sensitivity: f64) -> Self {
        match self {
            MechanismBuilder::Gaussian(b) => {
                MechanismBuilder::Gaussian(b.with_l2_sensitivity(l2_sensitivity))
            }
            laplace => laplace,
        }
    }

    pub fn build(&self) -> Result<Mechanism> {
        match self {
            MechanismBuilder::Laplace(b) => b.build().map(Mechanism::Laplace),
            MechanismBuilder::Gaussian(b) => b.build().map(Mechanism::Gaussian),
        }
    }
}

impl From<LaplaceBuilder> for MechanismBuilder {
    fn from(builder: LaplaceBuilder) -> Self {
        MechanismBuilder::Laplace(builder)
    }
}

impl From<GaussianBuilder> for MechanismBuilder {
    fn from(builder: GaussianBuilder) -> Self {
        MechanismBuilder::Gaussian(builder)
    }
}
