//! Granularity-snapped Gaussian noise
//!
//! A centred binomial approximates the normal distribution closely once n is
//! large:
//!
//! ```text
//! X = Binomial(n, 1/2) - n/2,   Var(X) = n/4
//! ```
//!
//! With `sqrt_n = 2σ / g` we get `stddev(X · g) = σ`, and `X · g` is an exact
//! multiple of the power-of-two granularity `g`. The granularity is chosen
//! so that `n` is close to 2^57.

use super::{next_power_of_two, NoiseSource};
use rand::RngCore;
use rand_distr::{Binomial, Distribution};

/// sqrt(2^57): target magnitude of sqrt(n)
const SQRT_BINOMIAL_BOUND: f64 = 379_625_062.497_006_24;

/// Gaussian noise source sampling on a power-of-two grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaussianNoise;

impl GaussianNoise {
    pub fn new() -> Self {
        GaussianNoise
    }

    /// Binomial(n, 1/2) over an even number of trials n
    fn fair_binomial(n: u64) -> Binomial {
        Binomial::new(n, 0.5).expect("p = 1/2 is a valid probability")
    }

    /// One draw of Binomial(n, 1/2) - n/2, an integer since n is even
    fn sample_centered(binomial: &Binomial, n: u64, rng: &mut dyn RngCore) -> i64 {
        binomial.sample(rng) as i64 - (n / 2) as i64
    }
}

impl NoiseSource for GaussianNoise {
    fn sample(&self, scale: f64, rng: &mut dyn RngCore) -> f64 {
        let granularity = self.granularity(scale);
        let sqrt_n = 2.0 * scale / granularity;
        let n = ((sqrt_n * sqrt_n / 2.0).floor() as u64) * 2;
        let binomial = Self::fair_binomial(n);
        Self::sample_centered(&binomial, n, rng) as f64 * granularity
    }

    fn granularity(&self, scale: f64) -> f64 {
        next_power_of_two(2.0 * scale / SQRT_BINOMIAL_BOUND)
    }
}
