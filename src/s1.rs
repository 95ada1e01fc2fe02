//! # S1 — Ordinary Leaves
//!
//! The ordinary-leaves sum of the Deléglise–Rivat decomposition:
//!
//! ```text
//! S1(x, y, c) = Σ_{m ≤ y, lpf(m) > p_c} μ(m) · φ(x/m, c)
//! ```
//!
//! Every φ here has a ≤ c ≤ 7, so each term is a closed-form
//! [`crate::phi_tiny`] evaluation; the sum is one pass over the μ/lpf
//! tables, parallelized as a rayon reduction.

use rayon::prelude::*;

use crate::imath::fast_div;
use crate::phi_tiny::phi_tiny;
use crate::tuning::ideal_num_threads;

/// `prime_c` is the c-th prime p_c; `lpf` and `mu` must cover [0, y].
pub fn s1(x: i128, y: i64, c: i64, prime_c: i64, lpf: &[i32], mu: &[i32], threads: usize) -> i128 {
    debug_assert!(lpf.len() as i64 > y && mu.len() as i64 > y);
    let threads = ideal_num_threads(threads, y as u128, 100_000);

    let term = |m: i64| -> i128 {
        let mi = m as usize;
        if mu[mi] != 0 && lpf[mi] > prime_c as i32 {
            mu[mi] as i128 * phi_tiny(fast_div(x, m), c)
        } else {
            0
        }
    };

    if threads <= 1 {
        (1..=y).map(term).sum()
    } else {
        (1..=y).into_par_iter().map(term).sum()
    }
}
