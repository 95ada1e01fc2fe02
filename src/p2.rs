//! # P2 — Prime-Pair Term
//!
//! Counts the integers ≤ x with exactly two prime factors, both larger
//! than y:
//!
//! ```text
//! P2(x, y) = Σ_{y < p ≤ √x} (π(x/p) − π(p) + 1)
//! ```
//!
//! Each summand counts the primes q ∈ [p, x/p]. Since p > y implies
//! x/p < x/y = z, one [`PiTable`] over [0, z] answers every lookup; the sum
//! over p is a rayon chunk reduction.

use rayon::prelude::*;

use crate::generate::generate_primes;
use crate::imath::{fast_div64, isqrt128};
use crate::pi_table::PiTable;
use crate::tuning::ideal_num_threads;

pub fn p2(x: i128, y: i64, threads: usize) -> i128 {
    let sqrtx = isqrt128(x);
    if y >= sqrtx {
        return 0;
    }
    let z = fast_div64(x, y.max(1));
    let threads = ideal_num_threads(threads, z as u128, 1 << 20);
    let pi = PiTable::new(z as u64, threads);
    let primes = generate_primes(sqrtx);

    let start = primes[1..].partition_point(|&p| p <= y) + 1;
    let term = |p: i64| (pi.pi(fast_div64(x, p)) - pi.pi(p) + 1) as i128;

    if threads <= 1 {
        primes[start..].iter().map(|&p| term(p)).sum()
    } else {
        primes[start..].par_iter().map(|&p| term(p)).sum()
    }
}

#[cfg(test)]
mod tests {
    //! Pinned against a brute-force count of semiprimes p·q ≤ x with
    //! y < p ≤ q.

    use super::*;

    fn p2_brute(x: i128, y: i64) -> i128 {
        let primes = generate_primes(isqrt128(x));
        let mut count = 0i128;
        for (i, &p) in primes.iter().enumerate().skip(1) {
            if p <= y {
                continue;
            }
            // q ranges over primes in [p, x/p]
            let xp = (x / p as i128) as i64;
            count += primes[i..].iter().take_while(|&&q| q <= xp).count() as i128;
        }
        count
    }

    #[test]
    fn matches_brute_force() {
        for &(x, y) in &[(100i128, 3i64), (1_000, 7), (10_000, 20), (100_000, 46), (1_000_000, 100)] {
            assert_eq!(p2(x, y, 1), p2_brute(x, y), "x = {}, y = {}", x, y);
        }
    }

    #[test]
    fn zero_when_y_at_least_sqrt_x() {
        assert_eq!(p2(10_000, 100, 1), 0);
        assert_eq!(p2(10_000, 1_000, 1), 0);
    }

    #[test]
    fn thread_independence() {
        let (x, y) = (100_000_000i128, 464i64);
        let reference = p2(x, y, 1);
        for threads in [2, 4] {
            assert_eq!(p2(x, y, threads), reference);
        }
    }
}
