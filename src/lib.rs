//! # Deepcount — Exact Prime Counting
//!
//! Computes π(x), the number of primes ≤ x, exactly, using the
//! Deléglise–Rivat combinatorial method with Gourdon's A + C engine
//! available alongside. No probabilistic shortcuts: every result is an
//! exact count.
//!
//! ## Module Organization
//!
//! **Engine modules** (the combinatorial machinery):
//! - [`phi`] — partial sieve function φ(x, a) with per-thread memoization
//! - [`deleglise_rivat`] — special-leaves sum S2 and the π(x) driver
//! - [`gourdon`] — merged A + C formulas over a sliding π window
//! - [`s1`] — ordinary leaves, [`p2`] — prime-pair term
//!
//! **Infrastructure modules** (tables and kernels):
//! - [`generate`] — primes, Möbius μ, least prime factors, dense π
//! - [`pi_table`], [`segmented_pi_table`] — O(1) π(n) lookups (wheel-240)
//! - [`bit_sieve`], [`counters`] — segmented bitset + Fenwick rank queries
//! - [`phi_tiny`] — closed-form φ(x, a) for a ≤ 7
//! - [`factor_table`] — compact μ/lpf over square-free numbers
//! - [`imath`], [`wheel240`], [`tuning`] — kernels, wheel masks, sizing
//!
//! ## Design Philosophy
//!
//! All heavy phases follow the same pattern: **generate tables → segment →
//! parallel reduction**. Shared tables are immutable after construction and
//! borrowed by worker threads; mutable state (φ caches, sieve segments) is
//! strictly thread-local. Sums are exact in 128-bit, so every result is
//! bit-identical regardless of thread count or segment size.
//!
//! ## Example
//!
//! ```
//! assert_eq!(deepcount::pi(1_000_000, 1).unwrap(), 78_498);
//! ```

pub mod bit_sieve;
pub mod counters;
pub mod deleglise_rivat;
pub mod error;
pub mod factor_table;
pub mod generate;
pub mod gourdon;
pub mod imath;
pub mod p2;
pub mod phi;
pub mod phi_tiny;
pub mod pi_table;
pub mod s1;
pub mod segmented_pi_table;
pub mod tuning;
pub mod wheel240;

pub use error::Error;
pub use phi::phi;

/// Largest x this build counts exactly. Bounded by the 128-bit leaf
/// arithmetic (products p·m and the z = x/y scale must stay in range for
/// every tuning the α clamp allows).
pub const MAX_PI_X: u128 = 10u128.pow(31);

/// The number of primes ≤ x, exactly.
///
/// `threads` bounds the parallelism of each phase (0 and 1 both mean
/// single-threaded). The result is bit-identical for every thread count.
///
/// # Errors
///
/// [`Error::InputOutOfRange`] if x > [`MAX_PI_X`].
pub fn pi(x: u128, threads: usize) -> Result<u128, Error> {
    if x > MAX_PI_X {
        return Err(Error::InputOutOfRange { x, max: MAX_PI_X });
    }
    Ok(deleglise_rivat::pi_impl(x as i128, threads) as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Entry-point contract ────────────────────────────────────────

    #[test]
    fn pi_literal_scenarios() {
        assert_eq!(pi(0, 1).unwrap(), 0);
        assert_eq!(pi(1, 1).unwrap(), 0);
        assert_eq!(pi(2, 1).unwrap(), 1);
        assert_eq!(pi(3, 1).unwrap(), 2);
        assert_eq!(pi(100, 1).unwrap(), 25);
        assert_eq!(pi(1_000_000, 1).unwrap(), 78_498);
    }

    #[test]
    fn pi_rejects_out_of_range() {
        assert_eq!(
            pi(MAX_PI_X + 1, 1),
            Err(Error::InputOutOfRange {
                x: MAX_PI_X + 1,
                max: MAX_PI_X
            })
        );
        // The boundary itself must stay within the signed internal type
        assert!(MAX_PI_X <= i128::MAX as u128);
    }

    #[test]
    fn pi_zero_threads_means_one() {
        assert_eq!(pi(10_000, 0).unwrap(), pi(10_000, 1).unwrap());
    }
}
