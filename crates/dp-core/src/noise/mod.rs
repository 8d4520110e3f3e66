//! Secure Noise Sources
//!
//! A [`NoiseSource`] draws zero-mean noise at a requested scale and snaps it
//! to a power-of-two granularity grid. Naive floating-point sampling leaks
//! information through the low-order bits of the result: the set of doubles
//! reachable from `x + noise` differs between neighbouring datasets. Sampling
//! an integer `k` and returning `k * granularity` makes every output land on
//! the same grid for a given scale.
//!
//! The mechanisms consume this trait, so tests can substitute a scripted
//! source that records the requested scales.

pub mod gaussian;
pub mod laplace;

pub use gaussian::GaussianNoise;
pub use laplace::LaplaceNoise;

use rand::RngCore;

/// Capability to draw granularity-snapped noise
///
/// Implementations must be safe for concurrent sampling: all randomness
/// comes from the `rng` argument, owned by the caller.
pub trait NoiseSource: Send + Sync {
    /// Draw one sample at the given positive scale
    ///
    /// The result is an exact multiple of `self.granularity(scale)`.
    fn sample(&self, scale: f64, rng: &mut dyn RngCore) -> f64;

    /// The snapping increment used at this scale, a power of two
    fn granularity(&self, scale: f64) -> f64;
}

/// Smallest positive double, 2^-1074
const MIN_GRANULARITY: f64 = 4.9406564584124654e-324;

/// Smallest power of two that is >= x, never below 2^-1074
pub fn next_power_of_two(x: f64) -> f64 {
    x.log2().ceil().exp2().max(MIN_GRANULARITY)
}

/// Beyond this many multiples of a power-of-two base, every double is
/// already a multiple of it
const EXACT_MULTIPLE_BOUND: f64 = (1u64 << 53) as f64;

/// Round x to the nearest multiple of base (ties away from zero)
///
/// `base` is a power of two. When `x / base` is at least 2^53 in magnitude
/// (or overflows), `x` is returned unchanged: it is already on the grid.
pub fn round_to_nearest_multiple(x: f64, base: f64) -> f64 {
    if base == 0.0 {
        return x;
    }
    let multiples = x / base;
    if !multiples.is_finite() || multiples.abs() >= EXACT_MULTIPLE_BOUND {
        return x;
    }
    multiples.round() * base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(1.0), 1.0);
        assert_eq!(next_power_of_two(3.0), 4.0);
        assert_eq!(next_power_of_two(4.0), 4.0);
        assert_eq!(next_power_of_two(0.3), 0.5);
        assert_eq!(next_power_of_two(1.0 / (1u64 << 40) as f64), 1.0 / (1u64 << 40) as f64);
        assert_eq!(next_power_of_two(1.5e-10), 2f64.powi(-32));
    }

    #[test]
    fn test_next_power_of_two_never_zero() {
        assert_eq!(next_power_of_two(0.0), MIN_GRANULARITY);
        assert_eq!(next_power_of_two(MIN_GRANULARITY), MIN_GRANULARITY);
        assert!(next_power_of_two(1e-310) > 0.0);
    }

    #[test]
    fn test_round_to_nearest_multiple() {
        assert_eq!(round_to_nearest_multiple(1.3, 0.5), 1.5);
        assert_eq!(round_to_nearest_multiple(-1.2, 0.5), -1.0);
        assert_eq!(round_to_nearest_multiple(7.0, 4.0), 8.0);
        assert_eq!(round_to_nearest_multiple(12.3, 0.0), 12.3);

        let g = next_power_of_two(1e-12);
        let snapped = round_to_nearest_multiple(0.123456789, g);
        assert_eq!(snapped % g, 0.0);
    }

    #[test]
    fn test_round_to_nearest_multiple_never_overflows() {
        let g = next_power_of_two(2.2e-308);
        assert_eq!(round_to_nearest_multiple(5.0, g), 5.0);
        assert_eq!(round_to_nearest_multiple(1e300, 2f64.powi(-40)), 1e300);
        assert_eq!(round_to_nearest_multiple(f64::MAX, 2f64.powi(-40)), f64::MAX);
        assert_eq!(round_to_nearest_multiple(-f64::MAX, 1.0), -f64::MAX);

        // Large values are already on the grid
        let x = 2f64.powi(60) + 2f64.powi(8);
        assert_eq!(round_to_nearest_multiple(x, 1.0), x);
        assert_eq!(x % 1.0, 0.0);
    }
}
