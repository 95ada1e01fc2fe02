//! # SegmentedPiTable — Windowed O(1) π(n) Lookup
//!
//! Same wheel-240 representation as [`crate::pi_table::PiTable`], but only
//! one window [low, high) is materialized at a time and `next()` slides it
//! forward. Lookups are valid for n ∈ [low, high) only; exactly one window
//! is live at any moment. This caps memory at O(segment_size) while the
//! A + C engine walks π values all the way up to √x.
//!
//! Each window is sieved in 240-aligned chunks (in parallel for large
//! windows); the running base count π(low − 1) is carried across `next()`
//! calls, so window counts stay absolute.

use rayon::prelude::*;

use crate::generate::generate_primes;
use crate::imath::isqrt;
use crate::pi_table::{sieve_prime_bits, PiEntry, PI_TINY};
use crate::wheel240::{UNSET_LARGER, WHEEL_SIZE};

pub struct SegmentedPiTable {
    entries: Vec<PiEntry>,
    sieving: Vec<u64>,
    limit: u64,
    segment_size: u64,
    low: u64,
    high: u64,
    threads: usize,
}

impl SegmentedPiTable {
    /// Table over [0, limit] advanced in windows of ~segment_size integers
    /// (rounded up to a multiple of 240).
    pub fn new(limit: u64, segment_size: u64, threads: usize) -> Self {
        let segment_size = segment_size
            .max(WHEEL_SIZE as u64)
            .div_ceil(WHEEL_SIZE as u64)
            * WHEEL_SIZE as u64;
        let sieving: Vec<u64> = generate_primes(isqrt(limit as u128) as i64)[1..]
            .iter()
            .filter(|&&p| p > 5)
            .map(|&p| p as u64)
            .collect();
        let mut table = SegmentedPiTable {
            entries: Vec::new(),
            sieving,
            limit,
            segment_size,
            low: 0,
            high: segment_size.min(limit + 1),
            threads,
        };
        table.sieve_window();
        table
    }

    #[inline]
    pub fn low(&self) -> u64 {
        self.low
    }

    #[inline]
    pub fn high(&self) -> u64 {
        self.high
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.low > self.limit
    }

    /// π(n) for n in the live window [low, high).
    #[inline]
    pub fn pi(&self, n: i64) -> i64 {
        debug_assert!(
            n >= 0 && self.low <= n as u64 && (n as u64) < self.high,
            "pi({n}) outside window [{}, {})",
            self.low,
            self.high
        );
        if n < 6 {
            return PI_TINY[n as usize];
        }
        let w = (n as u64 - self.low) as usize / WHEEL_SIZE;
        let e = &self.entries[w];
        (e.count + (e.bits & UNSET_LARGER[n as usize % WHEEL_SIZE]).count_ones() as u64) as i64
    }

    /// Advance to the next window.
    pub fn next(&mut self) {
        self.low += self.segment_size;
        self.high = (self.low + self.segment_size).min(self.limit + 1);
        if !self.finished() {
            self.sieve_window();
        }
    }

    fn sieve_window(&mut self) {
        let n_windows = ((self.high - self.low) as usize).div_ceil(WHEEL_SIZE);
        // Base count: π(low − 1), seeded with +3 for the off-wheel primes
        let mut count = if self.low == 0 {
            3
        } else {
            let last = self.entries.len() - 1;
            self.entries[last].count + self.entries[last].bits.count_ones() as u64
        };

        self.entries.resize(n_windows, PiEntry::default());
        const CHUNK_WINDOWS: usize = 1 << 14;
        let base_low = self.low;
        let high = self.high;
        let sieving = &self.sieving;
        if self.threads > 1 && n_windows > CHUNK_WINDOWS {
            self.entries
                .par_chunks_mut(CHUNK_WINDOWS)
                .enumerate()
                .for_each(|(c, chunk)| {
                    let low = base_low + (c * CHUNK_WINDOWS * WHEEL_SIZE) as u64;
                    sieve_prime_bits(chunk, low, high, sieving);
                });
        } else {
            self.entries
                .chunks_mut(CHUNK_WINDOWS)
                .enumerate()
                .for_each(|(c, chunk)| {
                    let low = base_low + (c * CHUNK_WINDOWS * WHEEL_SIZE) as u64;
                    sieve_prime_bits(chunk, low, high, sieving);
                });
        }

        for e in self.entries.iter_mut() {
            let bits = e.bits.count_ones() as u64;
            e.count = count;
            count += bits;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Window-by-window agreement with the monolithic PiTable across
    //! several segment sizes.

    use super::*;
    use crate::pi_table::PiTable;

    fn check_against_full(limit: u64, segment_size: u64) {
        let full = PiTable::new(limit, 1);
        let mut seg = SegmentedPiTable::new(limit, segment_size, 1);
        let mut seen = 0u64;
        while !seg.finished() {
            for n in seg.low().max(0)..seg.high() {
                assert_eq!(
                    seg.pi(n as i64),
                    full.pi(n as i64),
                    "pi({}) seg {} [{}, {})",
                    n,
                    segment_size,
                    seg.low(),
                    seg.high()
                );
                seen += 1;
            }
            seg.next();
        }
        assert_eq!(seen, limit + 1, "every n visited exactly once");
    }

    #[test]
    fn agrees_with_pi_table_small_segments() {
        check_against_full(10_000, 240);
        check_against_full(10_000, 1_000);
    }

    #[test]
    fn agrees_with_pi_table_larger_segments() {
        check_against_full(100_000, 1 << 12);
        check_against_full(100_000, 1 << 16);
    }

    #[test]
    fn single_window_covers_everything() {
        // segment_size > limit collapses to one window
        check_against_full(5_000, 1 << 20);
    }

    #[test]
    fn window_bookkeeping() {
        let mut seg = SegmentedPiTable::new(2_000, 480, 1);
        assert_eq!(seg.low(), 0);
        assert_eq!(seg.high(), 480);
        assert!(!seg.finished());
        let mut windows = 0;
        while !seg.finished() {
            assert!(seg.high() <= 2_001);
            windows += 1;
            seg.next();
        }
        assert_eq!(windows, 2_001u64.div_ceil(480));
    }
}
