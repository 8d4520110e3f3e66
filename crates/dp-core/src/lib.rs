//! DP Core - Numerical Mechanisms for Differential Privacy
//!
//! Pure Rust implementation of the Laplace and Gaussian mechanisms, with
//! floating-point-safe noise sampling for releasing aggregate statistics.
//!
//! # Features
//!
//! - Laplace mechanism for (ε, 0)-DP
//! - Gaussian mechanism for (ε, δ)-DP with analytic σ calibration
//! - Sensitivity derivation from L0 and LInf bounds
//! - Granularity-snapped noise (no low-order bit leakage)
//! - Per-call privacy budget fractions
//! - Noise confidence intervals and above-threshold tests
//! - Serde-loadable builder configuration
//!
//! # Example
//!
//! ```rust
//! use dp_core::{LaplaceBuilder, NumericalMechanism};
//!
//! let mechanism = LaplaceBuilder::new()
//!     .with_epsilon(1.0)
//!     .with_l1_sensitivity(1.0)
//!     .build()
//!     .unwrap();
//!
//! let mut rng = dp_core::rng::seeded(42);
//! let noised = mechanism.add_noise(100.0, &mut rng);
//!
//! let ci = mechanism.noise_confidence_interval(0.95, 1.0, noised).unwrap();
//! println!("{:.2} in [{:.2}, {:.2}]", noised, ci.lower_bound(), ci.upper_bound());
//! ```

pub mod builder;
pub mod confidence;
pub mod error;
pub mod gaussian;
pub mod laplace;
pub mod mechanism;
pub mod noise;
pub mod rng;
pub mod stats;
pub mod validation;

// Re-export commonly used types for convenience
pub use builder::MechanismBuilder;
pub use confidence::ConfidenceInterval;
pub use error::{ErrorKind, MechanismError, Result};
pub use gaussian::{GaussianBuilder, GaussianMechanism};
pub use laplace::{LaplaceBuilder, LaplaceMechanism};
pub use mechanism::{Mechanism, NumericalMechanism};
pub use noise::{GaussianNoise, LaplaceNoise, NoiseSource};
pub use rng::NoiseRng;
