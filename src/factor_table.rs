//! # FactorTable — Compact μ/lpf over Square-Free Numbers
//!
//! The special-leaves sieve only ever consults μ(m) and lpf(m) at
//! square-free m (μ(m) = 0 leaves contribute nothing), so this table stores
//! both values only at those indices, with a bidirectional index ↔ number
//! mapping. μ and lpf share one `i32` per entry: the magnitude is lpf(m)
//! (saturated, lpf(1) = i32::MAX) and the sign is μ(m).
//!
//! Invariant: every square-free n ∈ [1, y] has a unique index and
//! `get_number(to_index(n)) == n`.

use crate::generate::{generate_least_prime_factors, generate_moebius};

pub struct FactorTable {
    /// n → index of the largest square-free number ≤ n (n ∈ [1, y]).
    indexes: Vec<u32>,
    /// index → the square-free number itself.
    numbers: Vec<i64>,
    /// index → lpf(m) with the sign of μ(m).
    mu_lpf: Vec<i32>,
}

impl FactorTable {
    pub fn new(y: i64) -> Self {
        assert!(y >= 1, "FactorTable requires y >= 1");
        let mu = generate_moebius(y);
        let lpf = generate_least_prime_factors(y);

        let mut indexes = vec![0u32; y as usize + 1];
        let mut numbers = Vec::new();
        let mut mu_lpf = Vec::new();
        for n in 1..=y as usize {
            if mu[n] != 0 {
                numbers.push(n as i64);
                // lpf[1] = i32::MAX carries μ(1) = +1 with the right sign
                mu_lpf.push(if mu[n] < 0 { -lpf[n] } else { lpf[n] });
            }
            indexes[n] = (numbers.len() - 1) as u32;
        }

        FactorTable {
            indexes,
            numbers,
            mu_lpf,
        }
    }

    /// Index of the largest square-free number ≤ n. n must be in [1, y].
    #[inline]
    pub fn to_index(&self, n: i64) -> usize {
        debug_assert!(n >= 1 && (n as usize) < self.indexes.len());
        self.indexes[n as usize] as usize
    }

    #[inline]
    pub fn get_number(&self, index: usize) -> i64 {
        self.numbers[index]
    }

    /// μ(m) ∈ {−1, +1} of the m at `index` (0 never occurs in the table).
    #[inline]
    pub fn mu(&self, index: usize) -> i64 {
        self.mu_lpf[index].signum() as i64
    }

    /// lpf(m) of the m at `index`; lpf(1) = i32::MAX.
    #[inline]
    pub fn lpf(&self, index: usize) -> i64 {
        self.mu_lpf[index].unsigned_abs() as i64
    }

    /// Number of square-free entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
