//! Granularity-snapped Laplace noise
//!
//! Instead of inverse-CDF sampling on doubles, we draw a two-sided geometric
//! integer `k` and return `k * g`, where `g` is a power of two close to
//! `scale / 2^40`:
//!
//! ```text
//! P(k) ∝ e^(-λ|k|),   λ = g / scale
//! ```
//!
//! For small `g / scale` this is the discretization of Laplace(0, scale) on
//! the grid g·ℤ.

use super::{next_power_of_two, NoiseSource};
use crate::rng::{fair_coin, uniform_double};
use rand::RngCore;

/// Ratio between the scale and the granularity of the output grid
const GRANULARITY_PARAM: f64 = (1u64 << 40) as f64;

/// Laplace noise source sampling on a power-of-two grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaplaceNoise;

impl LaplaceNoise {
    pub fn new() -> Self {
        LaplaceNoise
    }

    /// Sample a geometric integer k >= 0 with P(k) = (1 - e^-λ) e^(-λk)
    ///
    /// Binary search over [0, i64::MAX]: at each step the interval is split
    /// where the remaining probability mass halves, and one uniform draw
    /// decides the side. Only conditional probabilities are computed, so no
    /// value of k is unreachable because of floating-point rounding.
    pub fn sample_geometric(lambda: f64, rng: &mut dyn RngCore) -> i64 {
        if uniform_double(rng) > -(-lambda * i64::MAX as f64).exp_m1() {
            return i64::MAX;
        }

        let mut lo: i64 = 0;
        let mut hi: i64 = i64::MAX;
        while lo + 1 < hi {
            let offset = ((0.5f64.ln() + (lambda * (lo - hi) as f64).exp().ln_1p()) / lambda).floor();
            let mid = lo.saturating_sub(offset as i64).clamp(lo + 1, hi - 1);

            // P(k + 1 <= mid | lo < k + 1 <= hi)
            let q = (lambda * (lo - mid) as f64).exp_m1() / (lambda * (lo - hi) as f64).exp_m1();
            if uniform_double(rng) <= q {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi - 1
    }
}

impl NoiseSource for LaplaceNoise {
    fn sample(&self, scale: f64, rng: &mut dyn RngCore) -> f64 {
        let granularity = self.granularity(scale);
        let lambda = granularity / scale;
        loop {
            let magnitude = Self::sample_geometric(lambda, rng);
            let positive = fair_coin(rng);
            // -0 and +0 are the same point; keeping both would double P(0)
            if magnitude == 0 && !positive {
                continue;
            }
            let signed = if positive { magnitude } else { -magnitude };
            return signed as f64 * granularity;
        }
    }

    fn granularity(&self, scale: f64) -> f64 {
        next_power_of_two(scale / GRANULARITY_PARAM)
    }
}
