//! # Tuning Oracles
//!
//! Pure functions of (x, y) that size the algorithm parameters. These trade
//! memory for speed and never affect correctness; every constant below is a
//! tuning, with a single source of truth for the α formula.

use crate::imath::{iroot, isqrt128};

/// Deléglise–Rivat tuning factor α sizing y = α·x^(1/3); grows like
/// (ln x)³ and is clamped to [1, x^(1/6)].
pub fn compute_alpha(x: i128) -> f64 {
    let d = x as f64;
    let alpha = d.ln().powi(3) / 1000.0;
    alpha.clamp(1.0, iroot::<6>(x as u128) as f64)
}

/// α implied by a concrete (x, y) pair.
pub fn get_alpha(x: i128, y: i64) -> f64 {
    y as f64 / iroot::<3>(x as u128) as f64
}

/// Gourdon's α_y (same growth law as the Deléglise–Rivat α).
pub fn get_alpha_y(x: i128) -> f64 {
    compute_alpha(x)
}

/// Gourdon's α_z ≥ 1, sizing z = α_z·y. Grows much slower than α_y so
/// that √z stays below x* and the C2 range π(√z) < b ≤ π(x*) is
/// non-degenerate.
pub fn get_alpha_z(alpha_y: f64) -> f64 {
    alpha_y.powf(1.0 / 3.0).max(1.0)
}

/// Gourdon's cutoff x* = max(x^(1/4), x/y²), clamped into [x^(1/4), √x].
/// Separates the C-formula regime (p ≤ x*) from the A-formula regime.
pub fn get_x_star_gourdon(x: i128, y: i64) -> i64 {
    let x14 = iroot::<4>(x as u128) as i64;
    let xy2 = (x / (y as i128 * y as i128)) as i64;
    x14.max(xy2).clamp(x14, isqrt128(x))
}

/// Gate the thread count by the amount of work: roughly one thread per
/// `per_thread` units, at least one, never more than requested.
pub fn ideal_num_threads(threads: usize, work: u128, per_thread: u128) -> usize {
    let max_useful = (work / per_thread.max(1)).max(1);
    threads.clamp(1, max_useful.min(usize::MAX as u128) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_clamped() {
        // Small x: the (ln x)³/1000 term is below 1
        assert_eq!(compute_alpha(100), 1.0);
        // Large x: bounded by x^(1/6)
        let x = 10i128.pow(30);
        assert!(compute_alpha(x) <= iroot::<6>(x as u128) as f64);
        assert!(compute_alpha(x) > 1.0);
    }

    #[test]
    fn alpha_grows_with_x() {
        let mut last = 0.0;
        for k in 10..=24 {
            let a = compute_alpha(10i128.pow(k));
            assert!(a >= last, "alpha(10^{}) = {}", k, a);
            last = a;
        }
    }

    #[test]
    fn x_star_bounds() {
        let x = 10i128.pow(15);
        let y = 1_500_000i64;
        let xs = get_x_star_gourdon(x, y);
        assert!(xs >= iroot::<4>(x as u128) as i64);
        assert!(xs <= isqrt128(x));
        // x/y² < x^(1/4) here, so the fourth root wins
        assert_eq!(xs, iroot::<4>(x as u128) as i64);
    }

    #[test]
    fn x_star_uses_xy2_when_y_small() {
        let x = 10i128.pow(12);
        let y = 2_000i64; // x/y² = 2.5·10^5 > x^(1/4) ≈ 10^3
        assert_eq!(get_x_star_gourdon(x, y), (x / (y as i128 * y as i128)) as i64);
    }

    #[test]
    fn thread_gating() {
        assert_eq!(ideal_num_threads(8, 100, 1000), 1);
        assert_eq!(ideal_num_threads(8, 100_000, 1000), 8);
        assert_eq!(ideal_num_threads(8, 3_000, 1000), 3);
        assert_eq!(ideal_num_threads(0, 10_000, 1), 1);
    }

    #[test]
    fn alpha_z_at_least_one() {
        assert_eq!(get_alpha_z(1.0), 1.0);
        assert!((get_alpha_z(8.0) - 2.0).abs() < 1e-9);
        assert!(get_alpha_z(1000.0) < 1000.0);
    }
}
