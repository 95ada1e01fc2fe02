//! # A + C — Gourdon's Merged Easy-Leaves Formulas
//!
//! Gourdon's variant partitions the same special leaves differently; the
//! A and C formulas roughly correspond to the easy leaves of
//! Deléglise–Rivat. Both enumerate prime pairs/square-free products whose
//! π lookups reach up to √x, so they share one pass of a
//! [`SegmentedPiTable`] over [1, √x] (memory O(z) instead of O(√x)) and
//! are merged into a single engine:
//!
//! - **C1**: recursive descent over square-free m coprime to the first b
//!   primes, for b ≤ π(√z) — full-table π lookups only, parallel over b;
//! - **C2**: clustered + sparse easy leaves for π(√z) < b ≤ π(x*), using
//!   the windowed table;
//! - **A**: prime pairs for π(x*) < b ≤ π(∛x), two-phase (single vs double
//!   count around x/(p·q) = y), using the windowed table.
//!
//! Inside each window, workers draw b values from a shared relaxed atomic
//! counter; every task only reads immutable tables and accumulates into a
//! thread-local sum, so no ordering is required, only progress.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::generate::generate_primes;
use crate::imath::{fast_div64, iroot, isqrt128, max3, min3};
use crate::pi_table::PiTable;
use crate::segmented_pi_table::SegmentedPiTable;
use crate::tuning::{get_x_star_gourdon, ideal_num_threads};

/// A + C with Gourdon's parameters (y, z, k). The segmented π table
/// advances in windows of z by default.
pub fn ac(x: i128, y: i64, z: i64, k: i64, threads: usize) -> i128 {
    ac_with_segment_size(x, y, z, k, z as u64, threads)
}

/// Test hook: identical result for any segment size (the windows only
/// partition the enumeration).
pub fn ac_with_segment_size(
    x: i128,
    y: i64,
    z: i64,
    k: i64,
    segment_size: u64,
    threads: usize,
) -> i128 {
    let time = Instant::now();
    let x_star = get_x_star_gourdon(x, y);
    let max_a_prime = isqrt128(x / x_star as i128);
    let max_prime = max_a_prime.max(y);
    let primes = generate_primes(max_prime);

    let x13 = iroot::<3>(x as u128) as i64;
    let threads = ideal_num_threads(threads, x13 as u128, 1_000);
    let pi = PiTable::new(z.max(max_a_prime) as u64, threads);
    let mut segmented_pi = SegmentedPiTable::new(isqrt128(x) as u64, segment_size, threads);
    debug!(%x, y, z, k, x_star, "A + C parameters");

    let pi_y = pi.pi(y);
    let pi_sqrtz = pi.pi(isqrt128(z.into()));
    let pi_x_star = pi.pi(x_star);
    let pi_root3_xy = pi.pi(iroot::<3>((x / y as i128) as u128) as i64);
    let pi_root3_xz = pi.pi(iroot::<3>((x / z as i128) as u128) as i64);

    // C1: x/(p_b·m) ≤ z, m square-free and coprime to the first b primes
    let min_b = k.max(pi_root3_xz);
    let c1_sum: i128 = (min_b + 1..=pi_sqrtz)
        .into_par_iter()
        .map(|b| {
            let prime = primes[b as usize];
            let xp = x / prime as i128;
            let max_m = fast_div64(xp, prime).min(z);
            let min_m = (x / (prime as i128 * prime as i128 * prime as i128))
                .max((z / prime) as i128)
                .min(max_m as i128) as i64;
            c1(xp, b, b, pi_y, 1, min_m, max_m, -1, &primes, &pi)
        })
        .sum();
    let mut sum = -c1_sum;

    // C2 and A share the sliding window over [1, √x]
    while !segmented_pi.finished() {
        let low = (segmented_pi.low() as i64).max(1);
        let high = segmented_pi.high() as i64;
        let x_div_low = x / low as i128;
        let x_div_high = x / high as i128;

        let min_prime1 = isqrt128(low as i128).min(primes[pi_x_star as usize]);
        let min_prime2 = ((x_div_high / y as i128) as i64).min(primes[pi_x_star as usize]);
        let mut min_b = max3(k, pi_sqrtz, pi_root3_xy);
        min_b = min_b.max(pi.pi(min_prime1));
        min_b = min_b.max(pi.pi(min_prime2));
        min_b = min_b.min(pi_x_star + 1);

        // primes[b]·primes[b+1] ≤ x/low bounds the largest useful b
        let sqrt_low = isqrt128(x_div_low).min(x13);
        let mut max_b = pi.pi(sqrt_low);
        if ((max_b + 1) as usize) < primes.len()
            && primes[max_b as usize] as i128 * primes[max_b as usize + 1] as i128 > x_div_low
        {
            max_b -= 1;
        }
        max_b = max_b.max(pi_x_star);

        // Workers pull b values from a shared counter; relaxed ordering
        // suffices because tasks are independent reads
        let next_b = AtomicI64::new(min_b + 1);
        let window_sum: i128 = (0..threads)
            .into_par_iter()
            .map(|_| {
                let mut local = 0i128;
                loop {
                    let b = next_b.fetch_add(1, Ordering::Relaxed);
                    if b > max_b {
                        break;
                    }
                    local += if b <= pi_x_star {
                        c2(x, y, b, x_div_low, x_div_high, &primes, &pi, &segmented_pi)
                    } else {
                        a_formula(x, y, b, max_a_prime, x_div_low, x_div_high, &primes, &pi, &segmented_pi)
                    };
                }
                local
            })
            .sum();
        sum += window_sum;
        segmented_pi.next();
    }

    info!(
        %x,
        ac = %sum,
        elapsed_ms = time.elapsed().as_millis() as u64,
        "A + C"
    );
    sum
}

/// Recursive square-free descent for the 1st part of the C formula: m runs
/// over square-free numbers coprime to the first b primes, the sign
/// alternating with each additional prime factor.
#[allow(clippy::too_many_arguments)]
fn c1(
    xp: i128,
    b: i64,
    i: i64,
    pi_y: i64,
    m: i64,
    min_m: i64,
    max_m: i64,
    mu: i64,
    primes: &[i64],
    pi: &PiTable,
) -> i128 {
    let mut sum = 0i128;
    for i in i + 1..=pi_y {
        let m128 = m as i128 * primes[i as usize] as i128;
        if m128 > max_m as i128 {
            return sum;
        }
        let m64 = m128 as i64;
        if m64 > min_m {
            let xpm = fast_div64(xp, m64);
            sum += mu as i128 * (pi.pi(xpm) - b + 2) as i128;
        }
        sum += c1(xp, b, i, pi_y, m64, min_m, max_m, -mu, primes, pi);
    }
    sum
}

/// 2nd part of the C formula: clustered + sparse easy leaves of the
/// current window, exactly as in Deléglise–Rivat but against the windowed
/// π table. Cluster batches whose boundary falls outside the window
/// degrade to single leaves (same sum, one lookup more).
#[allow(clippy::too_many_arguments)]
fn c2(
    x: i128,
    y: i64,
    b: i64,
    x_div_low: i128,
    x_div_high: i128,
    primes: &[i64],
    pi: &PiTable,
    segmented_pi: &SegmentedPiTable,
) -> i128 {
    let prime = primes[b as usize];
    let xp = x / prime as i128;
    let mut sum = 0i128;

    let max_m = min3(
        x_div_low / prime as i128,
        xp / prime as i128,
        y as i128,
    ) as i64;
    let min_m = max3(
        x_div_high / prime as i128,
        x / (prime as i128 * prime as i128 * prime as i128),
        prime as i128,
    )
    .min(max_m as i128) as i64;

    let mut i = pi.pi(max_m);
    let pi_min_m = pi.pi(min_m);
    let min_clustered = isqrt128(xp).clamp(min_m, max_m);
    let pi_min_clustered = pi.pi(min_clustered);

    let low = segmented_pi.low() as i64;
    let high = segmented_pi.high() as i64;

    // Clustered: batch runs of q with identical π(x/(p·q)). The batch is
    // clamped at min_m so it never eats leaves that belong to a later
    // window (they get the same φ value there).
    while i > pi_min_clustered {
        let xpq = fast_div64(xp, primes[i as usize]);
        let phi_xpq = segmented_pi.pi(xpq) - b + 2;
        let xpq2 = fast_div64(xp, primes[(b + phi_xpq - 1) as usize]).max(min_m);
        if xpq2 < low || xpq2 >= high {
            // Batch boundary outside the window: take this leaf alone
            sum += phi_xpq as i128;
            i -= 1;
            continue;
        }
        let i2 = segmented_pi.pi(xpq2);
        sum += phi_xpq as i128 * (i - i2) as i128;
        i = i2;
    }

    // Sparse: one lookup per leaf
    while i > pi_min_m {
        let xpq = fast_div64(xp, primes[i as usize]);
        sum += (segmented_pi.pi(xpq) - b + 2) as i128;
        i -= 1;
    }
    sum
}

/// A formula: prime pairs p·q with p fixed, q ascending. While
/// x/(p·q) ≥ y each pair counts π(x/(p·q)) once; below y it counts twice.
#[allow(clippy::too_many_arguments)]
fn a_formula(
    x: i128,
    y: i64,
    b: i64,
    max_a_prime: i64,
    x_div_low: i128,
    x_div_high: i128,
    primes: &[i64],
    pi: &PiTable,
    segmented_pi: &SegmentedPiTable,
) -> i128 {
    let prime = primes[b as usize];
    let xp = x / prime as i128;
    let mut sum = 0i128;

    let min_2nd_prime = (x_div_high / prime as i128).min(max_a_prime as i128) as i64;
    let mut i = (pi.pi(min_2nd_prime) + 1).max(b + 1);
    let max_2nd_prime = (x_div_low / prime as i128).min(isqrt128(xp) as i128) as i64;
    let max_i = pi.pi(max_2nd_prime);

    while i <= max_i {
        let xpq = fast_div64(xp, primes[i as usize]);
        if xpq < y {
            break;
        }
        sum += segmented_pi.pi(xpq) as i128;
        i += 1;
    }
    while i <= max_i {
        let xpq = fast_div64(xp, primes[i as usize]);
        sum += 2 * segmented_pi.pi(xpq) as i128;
        i += 1;
    }
    sum
}
