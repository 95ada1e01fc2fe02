//! # PiTable — O(1) π(n) Lookup
//!
//! Dense prime-counting table over [0, limit] in the wheel-240
//! representation: per 240-integer window one `u64` of prime bits (64 wheel
//! residues) and one cumulative count of all primes below the window start.
//! A lookup is one popcount:
//!
//! ```text
//! π(n) = count[n/240] + popcount(bits[n/240] & UNSET_LARGER[n % 240])
//! ```
//!
//! The wheel cannot represent 2, 3 and 5, so every window count carries a
//! +3 base offset and lookups below 6 read a six-entry table. Memory is
//! 16 bytes per 240 integers (~6.7% of one byte per integer).
//!
//! Construction sieves 240-aligned chunks independently (in parallel via
//! rayon for large tables) and then accumulates window counts in one
//! sequential pass.

use rayon::prelude::*;

use crate::generate::generate_primes;
use crate::imath::isqrt;
use crate::wheel240::{UNSET_BIT, UNSET_LARGER, WHEEL_SIZE};

/// π(n) for n ≤ 5; the wheel handles everything above.
pub(crate) const PI_TINY: [i64; 6] = [0, 0, 1, 2, 2, 3];

#[derive(Clone, Copy, Default)]
pub(crate) struct PiEntry {
    /// Number of primes < this window's first integer (includes 2, 3, 5).
    pub count: u64,
    /// One bit per wheel residue that is prime.
    pub bits: u64,
}

/// Sieve prime bits for the 240-aligned range [low, low + 240·entries.len()),
/// crossing composites up to `high`. `sieving_primes` must cover every prime
/// in (5, √high]. Counts are left untouched.
pub(crate) fn sieve_prime_bits(entries: &mut [PiEntry], low: u64, high: u64, sieving_primes: &[u64]) {
    debug_assert!(low % WHEEL_SIZE as u64 == 0);
    for e in entries.iter_mut() {
        e.bits = u64::MAX;
    }
    if low == 0 {
        // 1 is on the wheel but not prime
        entries[0].bits &= UNSET_BIT[1];
    }
    let chunk_high = (low + (entries.len() * WHEEL_SIZE) as u64).min(high);
    for &p in sieving_primes {
        if p * p >= chunk_high {
            break;
        }
        let mut m = (p * p).max(low.div_ceil(p) * p);
        if m % 2 == 0 {
            m += p;
        }
        while m < chunk_high {
            let w = ((m - low) / WHEEL_SIZE as u64) as usize;
            entries[w].bits &= UNSET_BIT[(m % WHEEL_SIZE as u64) as usize];
            m += 2 * p;
        }
    }
}

/// Windows per parallel construction chunk (~3.9M integers each).
const CHUNK_WINDOWS: usize = 1 << 14;

pub struct PiTable {
    entries: Vec<PiEntry>,
    limit: u64,
}

impl PiTable {
    pub fn new(limit: u64, threads: usize) -> Self {
        let n_windows = (limit / WHEEL_SIZE as u64 + 1) as usize;
        let mut entries = vec![PiEntry::default(); n_windows];
        let sieving: Vec<u64> = generate_primes(isqrt(limit as u128) as i64)[1..]
            .iter()
            .filter(|&&p| p > 5)
            .map(|&p| p as u64)
            .collect();

        if threads > 1 && n_windows > CHUNK_WINDOWS {
            entries
                .par_chunks_mut(CHUNK_WINDOWS)
                .enumerate()
                .for_each(|(c, chunk)| {
                    let low = (c * CHUNK_WINDOWS * WHEEL_SIZE) as u64;
                    sieve_prime_bits(chunk, low, limit + 1, &sieving);
                });
        } else {
            entries.chunks_mut(CHUNK_WINDOWS).enumerate().for_each(|(c, chunk)| {
                let low = (c * CHUNK_WINDOWS * WHEEL_SIZE) as u64;
                sieve_prime_bits(chunk, low, limit + 1, &sieving);
            });
        }

        // Cumulative counts; +3 accounts for the off-wheel primes 2, 3, 5
        let mut count = 3u64;
        for e in entries.iter_mut() {
            e.count = count;
            count += e.bits.count_ones() as u64;
        }

        PiTable { entries, limit }
    }

    /// π(n). Looking up n > limit is a programming error.
    #[inline]
    pub fn pi(&self, n: i64) -> i64 {
        debug_assert!(n >= 0 && n as u64 <= self.limit, "pi({n}) beyond limit {}", self.limit);
        if n < 6 {
            return PI_TINY[n as usize];
        }
        let e = &self.entries[n as usize / WHEEL_SIZE];
        (e.count + (e.bits & UNSET_LARGER[n as usize % WHEEL_SIZE]).count_ones() as u64) as i64
    }

    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    //! Cross-validated against the dense table from `generate_pi`.

    use super::*;
    use crate::generate::generate_pi;

    #[test]
    fn matches_dense_pi_exhaustively() {
        let limit = 100_000;
        let table = PiTable::new(limit, 1);
        let dense = generate_pi(limit as i64);
        for n in 0..=limit as i64 {
            assert_eq!(table.pi(n), dense[n as usize] as i64, "pi({})", n);
        }
    }

    #[test]
    fn known_pi_values() {
        let table = PiTable::new(10_000_000, 1);
        assert_eq!(table.pi(10), 4);
        assert_eq!(table.pi(100), 25);
        assert_eq!(table.pi(1_000), 168);
        assert_eq!(table.pi(10_000), 1_229);
        assert_eq!(table.pi(1_000_000), 78_498);
        assert_eq!(table.pi(10_000_000), 664_579);
    }

    #[test]
    fn window_boundaries() {
        let table = PiTable::new(1_000, 1);
        let dense = generate_pi(1_000);
        for n in [239i64, 240, 241, 479, 480, 481, 959, 960] {
            assert_eq!(table.pi(n), dense[n as usize] as i64, "pi({})", n);
        }
    }

    #[test]
    fn tiny_limits() {
        for limit in 0..=30u64 {
            let table = PiTable::new(limit, 1);
            let dense = generate_pi(limit as i64);
            for n in 0..=limit as i64 {
                assert_eq!(table.pi(n), dense[n as usize] as i64, "limit {} pi({})", limit, n);
            }
        }
    }

    #[test]
    fn parallel_build_is_identical() {
        let limit = 10_000_000;
        let seq = PiTable::new(limit, 1);
        let par = PiTable::new(limit, 4);
        for n in (0..=limit as i64).step_by(997) {
            assert_eq!(seq.pi(n), par.pi(n), "pi({})", n);
        }
        assert_eq!(seq.pi(limit as i64), par.pi(limit as i64));
    }
}
