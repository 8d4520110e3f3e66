//! Closed-form distribution functions
//!
//! CDFs and quantiles of the zero-mean Laplace and normal distributions,
//! used for confidence intervals, threshold tests and the Gaussian
//! calibration search.

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::{PI, SQRT_2};

/// Beyond this z, `erfc(z / sqrt 2)` is replaced by its asymptotic series
const TAIL_ASYMPTOTIC_THRESHOLD: f64 = 30.0;

/// CDF of Laplace(0, b) at x
///
/// ```text
/// F(x) = 0.5 * e^(x/b)          for x <= 0
/// F(x) = 1 - 0.5 * e^(-x/b)     for x > 0
/// ```
pub fn laplace_cdf(diversity: f64, x: f64) -> f64 {
    if x > 0.0 {
        1.0 - 0.5 * (-x / diversity).exp()
    } else {
        0.5 * (x / diversity).exp()
    }
}

/// CDF of N(0, stddev²) at x
pub fn normal_cdf(stddev: f64, x: f64) -> f64 {
    0.5 * erfc(-x / (stddev * SQRT_2))
}

/// CDF of the standard normal distribution
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Quantile (inverse CDF) of the standard normal distribution, p in (0, 1)
pub fn normal_quantile(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// ln P(Z > z) for a standard normal Z
///
/// Stays finite long after `P(Z > z)` itself underflows, so callers can form
/// `e^ε · P(Z > z)` in log space.
pub fn ln_normal_tail(z: f64) -> f64 {
    if z < TAIL_ASYMPTOTIC_THRESHOLD {
        return (0.5 * erfc(z / SQRT_2)).ln();
    }
    // Mills ratio: P(Z > z) ≈ φ(z)/z · (1 - 1/z² + 3/z⁴)
    let z2 = z * z;
    -0.5 * z2 - z.ln() - 0.5 * (2.0 * PI).ln() + (-1.0 / z2 + 3.0 / (z2 * z2)).ln_1p()
}
