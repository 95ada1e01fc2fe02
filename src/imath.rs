//! # Integer Kernels
//!
//! Exact integer arithmetic primitives shared by every engine module:
//! square and k-th roots, fast mixed-width division, power-of-two sizing
//! and 3-way min/max. All roots are exact (floor semantics) over the full
//! `u128` range; floating point is used only to seed Newton iterations,
//! never to produce a result.

/// Largest k with k² ≤ n. Exact for all n < 2¹²⁸.
///
/// Newton's method seeded from a power-of-two upper bound; the iteration
/// x ← (x + n/x) / 2 is monotonically decreasing from any seed ≥ √n and
/// stops at ⌊√n⌋.
#[inline]
pub fn isqrt(n: u128) -> u64 {
    if n == 0 {
        return 0;
    }
    let bits = 128 - n.leading_zeros();
    let mut x0 = 1u128 << ((bits + 1) / 2);
    let mut x1 = (x0 + n / x0) / 2;
    while x1 < x0 {
        x0 = x1;
        x1 = (x0 + n / x0) / 2;
    }
    x0 as u64
}

/// `isqrt` over non-negative signed values (the algorithms carry x as i128).
#[inline]
pub fn isqrt128(n: i128) -> i64 {
    debug_assert!(n >= 0);
    isqrt(n as u128) as i64
}

/// n^exp in u128, saturating at u128::MAX on overflow. The saturation makes
/// root fixup loops safe: a saturated power always compares greater.
#[inline]
fn ipow_sat(n: u128, exp: u32) -> u128 {
    let mut result = 1u128;
    for _ in 0..exp {
        result = match result.checked_mul(n) {
            Some(r) => r,
            None => return u128::MAX,
        };
    }
    result
}

/// Largest m with m^K ≤ n. K ∈ {2, 3, 4, 6} in practice, any K ≥ 2 works.
pub fn iroot<const K: u32>(n: u128) -> u64 {
    debug_assert!(K >= 2);
    if K == 2 {
        return isqrt(n);
    }
    if n == 0 {
        return 0;
    }
    // Float seed, then fix up in both directions. The f64 estimate of a
    // u128 is accurate to ~2^-52 relative error, so the loops run O(1) times.
    let mut r = (n as f64).powf(1.0 / K as f64) as u64;
    r = r.saturating_sub(2);
    while ipow_sat(r as u128 + 1, K) <= n {
        r += 1;
    }
    while ipow_sat(r as u128, K) > n {
        r -= 1;
    }
    r
}

/// ⌊a/b⌋ where the dividend may be 128-bit but usually fits in 64 bits.
/// 64-bit division is an order of magnitude faster than 128-bit on x86-64,
/// and in the leaf loops the quotient path is taken almost always.
#[inline]
pub fn fast_div(a: i128, b: i64) -> i128 {
    debug_assert!(a >= 0 && b > 0);
    if a <= u64::MAX as i128 {
        ((a as u64) / (b as u64)) as i128
    } else {
        a / (b as i128)
    }
}

/// ⌊a/b⌋ asserting the quotient fits in 64 bits (callers index tables
/// with the result).
#[inline]
pub fn fast_div64(a: i128, b: i64) -> i64 {
    let q = fast_div(a, b);
    debug_assert!(q <= i64::MAX as i128, "fast_div64 quotient exceeds i64");
    q as i64
}

/// n·n without widening; callers guarantee no wraparound.
#[inline]
pub fn isquare(n: i64) -> i64 {
    debug_assert!(n.checked_mul(n).is_some(), "isquare({n}) wraps");
    n * n
}

/// ⌈a/b⌉ for non-negative a, positive b.
#[inline]
pub fn ceil_div(a: u64, b: u64) -> u64 {
    debug_assert!(b > 0);
    (a + b - 1) / b
}

/// Least power of two ≥ n.
#[inline]
pub fn next_power_of_2(n: u64) -> u64 {
    n.max(1).next_power_of_two()
}

#[inline]
pub fn min3<T: Ord>(a: T, b: T, c: T) -> T {
    a.min(b).min(c)
}

#[inline]
pub fn max3<T: Ord>(a: T, b: T, c: T) -> T {
    a.max(b).max(c)
}

#[cfg(test)]
mod tests {
    //! Exactness tests at word-width boundaries, where float-seeded root
    //! finding is most likely to be off by one: perfect powers, perfect
    //! powers ± 1, u64::MAX, and the top of the i128 range.

    use super::*;

    // ── Square roots ────────────────────────────────────────────────

    #[test]
    fn isqrt_small_values() {
        let expected = [0, 1, 1, 1, 2, 2, 2, 2, 2, 3, 3];
        for (n, &e) in expected.iter().enumerate().map(|(n, e)| (n as u128, e)) {
            assert_eq!(isqrt(n), e, "isqrt({})", n);
        }
    }

    #[test]
    fn isqrt_perfect_squares_and_neighbors() {
        for k in [1u128, 2, 3, 10, 1_000, 65_535, 65_536, 4_294_967_295, 4_294_967_296] {
            let sq = k * k;
            assert_eq!(isqrt(sq) as u128, k);
            assert_eq!(isqrt(sq - 1) as u128, k - 1);
            assert_eq!(isqrt(sq + 1) as u128, k);
        }
    }

    #[test]
    fn isqrt_u64_max_boundary() {
        // (2^64 - 1)^2 is the largest square with a u64 root
        let m = u64::MAX as u128;
        assert_eq!(isqrt(m * m), u64::MAX);
        assert_eq!(isqrt(m * m - 1), u64::MAX - 1);
        // Top of the supported i128 range
        assert_eq!(isqrt(i128::MAX as u128) as u128, 13_043_817_825_332_782_212);
    }

    // ── k-th roots ──────────────────────────────────────────────────

    #[test]
    fn iroot_cubes() {
        assert_eq!(iroot::<3>(0), 0);
        assert_eq!(iroot::<3>(1), 1);
        assert_eq!(iroot::<3>(7), 1);
        assert_eq!(iroot::<3>(8), 2);
        assert_eq!(iroot::<3>(1_000_000_000_000), 10_000);
        assert_eq!(iroot::<3>(999_999_999_999), 9_999);
    }

    #[test]
    fn iroot_fourth_and_sixth() {
        assert_eq!(iroot::<4>(16), 2);
        assert_eq!(iroot::<4>(15), 1);
        assert_eq!(iroot::<4>(10_000_000_000_000_000), 10_000);
        assert_eq!(iroot::<6>(64), 2);
        assert_eq!(iroot::<6>(63), 1);
        assert_eq!(iroot::<6>(1_000_000_000_000_000_000), 1_000);
    }

    #[test]
    fn iroot_large_boundaries() {
        // k^6 at the top of the u64-root range
        let k = 2_097_151u128; // 2^21 - 1
        assert_eq!(iroot::<6>(k.pow(6)) as u128, k);
        assert_eq!(iroot::<6>(k.pow(6) - 1) as u128, k - 1);
    }

    // ── Division helpers ────────────────────────────────────────────

    #[test]
    fn fast_div_matches_wide_division() {
        let cases: &[(i128, i64)] = &[
            (0, 1),
            (100, 7),
            (u64::MAX as i128, 3),
            (u64::MAX as i128 + 1, 3),
            (10_i128.pow(30), 999_983),
        ];
        for &(a, b) in cases {
            assert_eq!(fast_div(a, b), a / b as i128, "fast_div({}, {})", a, b);
        }
    }

    #[test]
    fn fast_div64_in_range() {
        assert_eq!(fast_div64(10_i128.pow(20), 10_i64.pow(10)), 10_i64.pow(10));
    }

    // ── Sizing helpers ──────────────────────────────────────────────

    #[test]
    fn next_power_of_2_values() {
        assert_eq!(next_power_of_2(0), 1);
        assert_eq!(next_power_of_2(1), 1);
        assert_eq!(next_power_of_2(3), 4);
        assert_eq!(next_power_of_2(4), 4);
        assert_eq!(next_power_of_2(1023), 1024);
    }

    #[test]
    fn ceil_div_values() {
        assert_eq!(ceil_div(0, 240), 0);
        assert_eq!(ceil_div(1, 240), 1);
        assert_eq!(ceil_div(240, 240), 1);
        assert_eq!(ceil_div(241, 240), 2);
    }

    #[test]
    fn min3_max3() {
        assert_eq!(min3(3, 1, 2), 1);
        assert_eq!(max3(3, 1, 2), 3);
        assert_eq!(min3(5, 5, 5), 5);
    }
}
