//! # φ(x, a) — Partial Sieve Function (Legendre Sum)
//!
//! φ(x, a) counts the integers in [1, x] not divisible by any of the first
//! a primes, via the recurrence
//!
//! ```text
//! φ(x, a) = φ(x, a − 1) − φ(⌊x / p_a⌋, a − 1)
//! ```
//!
//! Four cuts collapse most of the recursion tree in O(1):
//!
//! 1. x ≤ p_a ⇒ φ = 1;
//! 2. a ≤ 7 ⇒ closed form via [`crate::phi_tiny`];
//! 3. x < p_{a+1}² ⇒ φ = π(x) − a + 1 (no composite in range survives);
//! 4. a cache hit.
//!
//! The cache ([`PhiCache`], one per worker thread, never shared) stores
//! φ(x, i) for all x ≤ max_x and 7 < i ≤ max_a as bit-packed wheel-240
//! windows with per-window cumulative counts: `sieve[i]` marks the numbers
//! coprime to the first i primes, built incrementally from `sieve[i − 1]`
//! by crossing off p_i, so a cached φ is one popcount. Sizing follows the
//! measured sweet spot: a ≤ 100, x ≤ x^(1/2.3), ≤ 16 MiB per thread.

use rayon::prelude::*;

use crate::deleglise_rivat;
use crate::generate::generate_n_primes;
use crate::imath::{isqrt, isquare};
use crate::phi_tiny::{self, get_c, is_phi_tiny, phi_tiny};
use crate::pi_table::PiTable;
use crate::tuning::ideal_num_threads;
use crate::wheel240::{UNSET_BIT, UNSET_LARGER, WHEEL_SIZE};

#[derive(Clone, Copy)]
struct CacheEntry {
    /// Count of set bits in all windows before this one.
    count: u32,
    bits: u64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        CacheEntry {
            count: 0,
            bits: u64::MAX,
        }
    }
}

pub struct PhiCache<'a> {
    /// sieve[a][j] marks the wheel numbers in window j coprime to the
    /// first a primes; empty until `sieve_cache` materializes level a.
    sieve: Vec<Vec<CacheEntry>>,
    max_x: u64,
    max_x_windows: u64,
    max_a_cached: i64,
    max_a: i64,
    primes: &'a [i64],
    pi: &'a PiTable,
}

/// Cache φ(x, a) only below this many levels; measured sweet spot.
const CACHE_MAX_A: u64 = 100;
/// Default per-thread cache budget.
const CACHE_BYTES: u64 = 16 << 20;

impl<'a> PhiCache<'a> {
    pub fn new(x: u64, a: i64, primes: &'a [i64], pi: &'a PiTable) -> Self {
        Self::with_budget(x, a, primes, pi, CACHE_BYTES)
    }

    /// Cache with an explicit per-thread byte budget (the
    /// `phi_cache_megabytes` knob).
    pub fn with_budget(
        x: u64,
        a: i64,
        primes: &'a [i64],
        pi: &'a PiTable,
        cache_bytes: u64,
    ) -> Self {
        let mut cache = PhiCache {
            sieve: Vec::new(),
            max_x: 0,
            max_x_windows: 0,
            max_a_cached: 0,
            max_a: 0,
            primes,
            pi,
        };

        // Cache only frequently-revisited levels: the top ~30 levels of the
        // recursion rarely repeat, everything below max_a = 100 does.
        let a = (a - a.min(30)) as u64;
        let max_a = a.min(CACHE_MAX_A);
        let tiny_a = phi_tiny::max_a() as u64;
        if max_a <= tiny_a {
            return cache;
        }

        // x-range: x^(1/2.3) capped by the per-thread memory budget
        let mut max_x = (x as f64).powf(1.0 / 2.3) as u64;
        let indexes = max_a - tiny_a;
        let bytes_per_index = cache_bytes / indexes;
        let numbers_per_byte = WHEEL_SIZE as u64 / std::mem::size_of::<CacheEntry>() as u64;
        max_x = max_x.min(bytes_per_index * numbers_per_byte);

        let max_x_windows = max_x.div_ceil(WHEEL_SIZE as u64);
        // Tiny computations are not worth caching
        if max_x_windows < 8 {
            return cache;
        }

        cache.max_x_windows = max_x_windows;
        cache.max_x = max_x_windows * WHEEL_SIZE as u64 - 1;
        cache.max_a = max_a as i64;
        cache.sieve = vec![Vec::new(); max_a as usize + 1];
        cache
    }

    /// sign · φ(x, a); sign ∈ {+1, −1} flips at each recursion level.
    pub fn phi(&mut self, x: i64, a: i64, sign: i64) -> i64 {
        if x <= self.primes[a as usize] {
            return sign;
        } else if is_phi_tiny(a) {
            return phi_tiny(x as i128, a) as i64 * sign;
        } else if self.is_pix(x, a) {
            return (self.pi.pi(x) - a + 1) * sign;
        } else if self.is_cached(x, a) {
            return self.phi_cache(x, a) * sign;
        }

        self.sieve_cache(x as u64, a);

        let sqrtx = isqrt(x as u128) as i64;
        let mut c = get_c(sqrtx);
        let larger_c = a.min(self.max_a_cached);
        let mut sum;
        if c >= larger_c || !self.is_cached(x, larger_c) {
            sum = phi_tiny(x as i128, c) as i64 * sign;
        } else {
            c = larger_c;
            sum = self.phi_cache(x, c) * sign;
        }

        let mut i = c;
        while i < a {
            // If p_{i+1} > √x there is no prime in (p_i, x/p_{i+1}], so
            // φ(x/p_{i+1}, i) = 1 for this and every remaining i.
            if self.primes[(i + 1) as usize] > sqrtx {
                break;
            }
            let xp = x / self.primes[(i + 1) as usize];
            if self.is_pix(xp, i) {
                break;
            }
            sum += self.phi(xp, i, -sign);
            i += 1;
        }
        while i < a {
            if self.primes[(i + 1) as usize] > sqrtx {
                break;
            }
            let xp = x / self.primes[(i + 1) as usize];
            sum += (self.pi.pi(xp) - i + 1) * -sign;
            i += 1;
        }
        sum += (a - i) * -sign;
        sum
    }

    /// x < p_{a+1}² ⇒ every survivor in (p_a, x] is prime, so
    /// φ(x, a) = π(x) − a + 1.
    #[inline]
    fn is_pix(&self, x: i64, a: i64) -> bool {
        x as u64 <= self.pi.limit() && x < isquare(self.primes[(a + 1) as usize])
    }

    #[inline]
    fn is_cached(&self, x: i64, a: i64) -> bool {
        x as u64 <= self.max_x && a <= self.max_a_cached
    }

    #[inline]
    fn phi_cache(&self, x: i64, a: i64) -> i64 {
        let e = &self.sieve[a as usize][x as usize / WHEEL_SIZE];
        e.count as i64 + (e.bits & UNSET_LARGER[x as usize % WHEEL_SIZE]).count_ones() as i64
    }

    /// Materialize cache levels up to min(a, max_a): level i is level i−1
    /// with p_i and its odd multiples crossed off, then re-counted.
    fn sieve_cache(&mut self, x: u64, a: i64) {
        let a = a.min(self.max_a);
        if x > self.max_x || a <= self.max_a_cached {
            return;
        }

        let tiny_a = phi_tiny::max_a();
        let start = (self.max_a_cached + 1).max(3);
        self.max_a_cached = a;

        for i in start..=a {
            if i == 3 {
                // The wheel itself encodes the first 3 primes
                self.sieve[3] = vec![CacheEntry::default(); self.max_x_windows as usize];
                continue;
            }
            // Levels ≤ tiny_a are never queried again once consumed, so
            // hand the buffer forward instead of copying it.
            self.sieve[i as usize] = if i - 1 <= tiny_a {
                std::mem::take(&mut self.sieve[i as usize - 1])
            } else {
                self.sieve[i as usize - 1].clone()
            };

            let prime = self.primes[i as usize] as u64;
            let level = &mut self.sieve[i as usize];
            if prime <= self.max_x {
                level[prime as usize / WHEEL_SIZE].bits &= UNSET_BIT[prime as usize % WHEEL_SIZE];
            }
            let mut n = prime * prime;
            while n <= self.max_x {
                level[n as usize / WHEEL_SIZE].bits &= UNSET_BIT[n as usize % WHEEL_SIZE];
                n += prime * 2;
            }

            if i > tiny_a {
                let mut count = 0u64;
                for e in level.iter_mut() {
                    e.count = count as u32;
                    count += e.bits.count_ones() as u64;
                }
            }
        }
    }
}

/// π(x) upper bound: π(x) ≤ x / (ln x − 1.1) + 10 for x ≥ 10.
fn pix_upper(x: i64) -> i64 {
    if x <= 10 {
        return 4;
    }
    (x as f64 / ((x as f64).ln() - 1.1)) as i64 + 10
}

/// φ(x, a) for a > π(√x): every survivor above p_a is prime, so the answer
/// follows from one π(x) computation. Callers must guarantee a > π(√x),
/// otherwise π would recurse back into φ.
fn phi_pix(x: i64, a: i64, threads: usize) -> i64 {
    let pix = deleglise_rivat::pi_impl(x as i128, threads) as i64;
    if a <= pix {
        pix - a + 1
    } else {
        1
    }
}

/// Partial sieve function φ(x, a): the count of integers in [1, x] with no
/// prime factor among the first a primes. Parallelizes the outer recursion
/// level; each worker owns a private [`PhiCache`].
pub fn phi(x: i64, a: i64, threads: usize) -> i64 {
    phi_with_cache_budget(x, a, threads, CACHE_BYTES >> 20)
}

/// [`phi`] with an explicit per-thread cache budget in mebibytes.
pub fn phi_with_cache_budget(x: i64, a: i64, threads: usize, megabytes: u64) -> i64 {
    let cache_bytes = megabytes << 20;
    if x < 1 {
        return 0;
    }
    if a < 1 {
        return x;
    }
    // p_a ≥ a + 1 > x ⇒ only the number 1 survives
    if a > x / 2 {
        return 1;
    }
    if is_phi_tiny(a) {
        return phi_tiny(x as i128, a) as i64;
    }
    if a >= pix_upper(x) {
        return 1;
    }

    let sqrtx = isqrt(x as u128) as i64;
    // Quick a > π(√x) check with a safe overestimate, then exactly
    if a > pix_upper(sqrtx) {
        return phi_pix(x, a, threads);
    }
    let pi = PiTable::new(sqrtx as u64, threads);
    if a > pi.pi(sqrtx) {
        return phi_pix(x, a, threads);
    }

    let primes = generate_n_primes(a + 1);
    let c = get_c(sqrtx);
    let sum = phi_tiny(x as i128, c) as i64;
    let threads = ideal_num_threads(threads, x as u128, 10_000_000_000);

    if threads <= 1 {
        let mut cache = PhiCache::with_budget(x as u64, a, &primes, &pi, cache_bytes);
        let mut sum = sum;
        for i in c..a {
            sum += cache.phi(x / primes[(i + 1) as usize], i, -1);
        }
        sum
    } else {
        sum + (c..a)
            .into_par_iter()
            .map_init(
                || PhiCache::with_budget(x as u64, a, &primes, &pi, cache_bytes),
                |cache, i| cache.phi(x / primes[(i + 1) as usize], i, -1),
            )
            .sum::<i64>()
    }
}
