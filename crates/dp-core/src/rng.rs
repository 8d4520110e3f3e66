//! Random Number Generation for Noise Sampling
//!
//! The mechanisms never reach for a process-wide generator. Every noising
//! call receives the caller's generator as `&mut dyn RngCore`, so a built
//! mechanism can be shared between threads without locking and results are
//! reproducible when the caller seeds its own generator.
//!
//! # Security Properties
//!
//! - [`NoiseRng`] is ChaCha20, a CSPRNG
//! - [`from_entropy`] seeds it from the OS entropy source
//! - [`seeded`] is for tests and benchmarks only: a known seed makes the
//!   noise predictable

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Generator used by default for noise sampling
pub type NoiseRng = ChaCha20Rng;

/// 2^53, the number of distinct doubles produced by [`uniform_double`]
const TWO_POW_53: f64 = (1u64 << 53) as f64;

/// A ChaCha20 generator seeded from OS entropy
pub fn from_entropy() -> NoiseRng {
    ChaCha20Rng::from_entropy()
}

/// A ChaCha20 generator with a fixed seed
pub fn seeded(seed: u64) -> NoiseRng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Generate a double uniformly distributed in [0, 1)
///
/// Uses 53 random bits (the mantissa precision of f64) divided by 2^53, so
/// every output is an exact multiple of 2^-53.
pub fn uniform_double(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 / TWO_POW_53
}

/// A fair coin flip
pub fn fair_coin(rng: &mut dyn RngCore) -> bool {
    rng.next_u64() & 1 == 1
}
