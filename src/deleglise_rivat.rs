//! # Deléglise–Rivat π(x)
//!
//! π(x) = S1 + S2 + π(y) − 1 − P2 with y = α·x^(1/3), z = x/y and
//! c = min(π(y), 7). S1 and P2 live in their own modules; this module owns
//! the special-leaves sum S2, split into the three leaf categories:
//!
//! - **trivial** leaves, a closed-form π-difference per prime;
//! - **easy** leaves (clustered + sparse), individual π lookups with the
//!   clustered identity batching runs of equal φ values;
//! - **hard** leaves, which need a segmented sieve with rank queries.
//!
//! The hard-leaves engine walks [1, z] in power-of-two segments. Per
//! segment it refills the wheel bitset, rebuilds the Fenwick counters, and
//! enumerates leaves in two b-ranges: square-free m via the
//! [`FactorTable`] (c < b ≤ π(√y)) and prime pairs (π(√y) < b ≤ π(√z)),
//! crossing off each prime's multiples before moving to the next b. The
//! per-b `phi[b]` accumulator carries the surviving count of earlier
//! segments so that `phi[b] + counters.query(i)` is φ(x/n, b − 1).
//!
//! Run time O(x^(2/3) / log² x), space O(x^(1/3) · log³ x).

use std::time::Instant;

use tracing::{debug, info};

use crate::bit_sieve::BitSieve;
use crate::counters::Counters;
use crate::factor_table::FactorTable;
use crate::generate::{generate_least_prime_factors, generate_moebius, generate_pi, generate_primes};
use crate::imath::{fast_div64, iroot, isqrt128, max3, min3, next_power_of_2};
use crate::p2::p2;
use crate::phi_tiny;
use crate::s1::s1;
use crate::tuning::compute_alpha;

/// Below this, counting primes directly beats setting up the machinery.
const SMALL_LIMIT: i128 = 100_000;

/// π(x) for any x ≥ 0 within the supported range; dispatches small x to a
/// plain sieve count.
pub(crate) fn pi_impl(x: i128, threads: usize) -> i128 {
    if x < SMALL_LIMIT {
        if x < 2 {
            return 0;
        }
        return (generate_primes(x as i64).len() - 1) as i128;
    }
    pi_deleglise_rivat(x, threads)
}

/// π(x) via Deléglise–Rivat with the default α tuning.
pub fn pi_deleglise_rivat(x: i128, threads: usize) -> i128 {
    pi_deleglise_rivat_with_alpha(x, compute_alpha(x), threads)
}

/// π(x) via Deléglise–Rivat with an explicit α (clamped to its valid
/// range); α trades memory for speed and never changes the result.
pub fn pi_deleglise_rivat_with_alpha(x: i128, alpha: f64, threads: usize) -> i128 {
    if x < 2 {
        return 0;
    }
    if x < SMALL_LIMIT {
        return (generate_primes(x as i64).len() - 1) as i128;
    }

    let time = Instant::now();
    let alpha = alpha.clamp(1.0, iroot::<6>(x as u128) as f64);
    let y = (alpha * iroot::<3>(x as u128) as f64) as i64;
    let z = fast_div64(x, y);
    debug!(%x, y, z, alpha, "deleglise-rivat parameters");

    let p2_result = p2(x, y, threads);
    debug!(p2 = %p2_result, "P2 done");

    let mu = generate_moebius(y);
    let lpf = generate_least_prime_factors(y);
    let primes = generate_primes(y);
    let pi_y = primes.len() as i64 - 1;
    let c = pi_y.min(phi_tiny::max_a());

    let s1_result = s1(x, y, c, primes[c as usize], &lpf, &mu, threads);
    debug!(s1 = %s1_result, "S1 done");

    let s2_result = s2(x, y, z, c, &primes);
    debug!(s2 = %s2_result, "S2 done");

    let phi = s1_result + s2_result;
    let sum = phi + pi_y as i128 - 1 - p2_result;
    info!(
        %x,
        pi = %sum,
        elapsed_ms = time.elapsed().as_millis() as u64,
        "pi(x) deleglise-rivat"
    );
    sum
}

/// Special-leaves sum S2 = trivial + easy + hard.
pub fn s2(x: i128, y: i64, z: i64, c: i64, primes: &[i64]) -> i128 {
    let pi = generate_pi(y);
    let factors = FactorTable::new(y);
    s2_trivial(x, y, z, c, &pi, primes)
        + s2_easy(x, y, z, c, &pi, primes)
        + s2_sieve(x, y, z, c, &pi, primes, &factors)
}

/// Trivial leaves: n = p_b · p_l with φ(x/n, b − 1) = 1.
pub(crate) fn s2_trivial(x: i128, y: i64, z: i64, c: i64, pi: &[i32], primes: &[i64]) -> i128 {
    let pi_y = pi[y as usize] as i64;
    let pi_sqrtz = pi[isqrt128(z.into()).min(y) as usize] as i64;
    let mut sum = 0i128;

    for b in (c.max(pi_sqrtz) + 1)..pi_y {
        let prime = primes[b as usize];
        let xpp = (x / (prime as i128 * prime as i128)) as i64;
        sum += (pi_y - pi[xpp.max(prime) as usize] as i64) as i128;
    }
    sum
}

/// Clustered and sparse easy leaves: x/n ≤ y, so
/// φ(x/n, b − 1) = π(x/n) − b + 2 is one table lookup. Clustered runs of
/// equal π(x/n) are batched via the next-prime-above identity.
pub(crate) fn s2_easy(x: i128, y: i64, z: i64, c: i64, pi: &[i32], primes: &[i64]) -> i128 {
    let pi_sqrty = pi[isqrt128(y.into()) as usize] as i64;
    let pi_x13 = pi[(iroot::<3>(x as u128) as i64).min(y) as usize] as i64;
    let mut sum = 0i128;

    for b in (c.max(pi_sqrty) + 1)..=pi_x13 {
        let prime = primes[b as usize];
        let min_trivial = (x / (prime as i128 * prime as i128)) as i64;
        let min_hard = (y / prime).max(prime);
        let min_clustered = isqrt128(x / prime as i128).max(min_hard);
        let min_sparse = (z / prime).max(min_hard);
        let mut l = pi[min_trivial.min(y) as usize] as i64;

        // Clustered: all leaves with the same φ(x/n, b − 1) contribute in
        // one batch of size l − l2
        while primes[l as usize] > min_clustered {
            let n = prime as i128 * primes[l as usize] as i128;
            let xn = (x / n) as i64;
            let phi_xn = pi[xn as usize] as i64 - b + 2;
            let m = prime as i128 * primes[(b + phi_xn - 1) as usize] as i128;
            let xm = ((x / m) as i64).max(min_clustered);
            let l2 = pi[xm as usize] as i64;
            sum += phi_xn as i128 * (l - l2) as i128;
            l = l2;
        }

        // Sparse: successive leaves differ, one lookup each
        while primes[l as usize] > min_sparse {
            let n = prime as i128 * primes[l as usize] as i128;
            let xn = (x / n) as i64;
            sum += (pi[xn as usize] as i64 - b + 2) as i128;
            l -= 1;
        }
    }
    sum
}

/// Cross off the odd multiples of `prime` in [*next_multiple, high),
/// updating the counters for every bit actually cleared, and advance
/// *next_multiple past the segment.
fn cross_off(
    prime: i64,
    low: i64,
    high: i64,
    next_multiple: &mut i64,
    sieve: &mut BitSieve,
    counters: &mut Counters,
) {
    let mut k = *next_multiple;
    while k < high {
        let i = (k - low) as usize;
        if sieve.get(i) {
            sieve.unset(i);
            counters.update(i);
        }
        k += prime * 2;
    }
    *next_multiple = k;
}

/// Hard special leaves: low ≤ x/n < high only resolvable with rank queries
/// against the partially sieved segment.
pub(crate) fn s2_sieve(
    x: i128,
    y: i64,
    z: i64,
    c: i64,
    pi: &[i32],
    primes: &[i64],
    factors: &FactorTable,
) -> i128 {
    let limit = z + 1;
    let pi_sqrty = pi[isqrt128(y.into()) as usize] as i64;
    let pi_sqrtz = pi[isqrt128(z.into()).min(y) as usize] as i64;
    if c >= pi_sqrtz {
        return 0;
    }

    let segment_size = next_power_of_2(isqrt128(limit.into()) as u64) as i64;
    let mut sum = 0i128;
    let mut sieve = BitSieve::new(segment_size as usize);
    let mut counters = Counters::new(segment_size as usize);
    // Only the first π(√z) primes ever sieve a segment
    let mut next: Vec<i64> = primes[..=pi_sqrtz as usize].to_vec();
    let mut phi = vec![0i64; pi_sqrtz as usize + 1];

    let mut low = 1i64;
    while low < limit {
        let high = (low + segment_size).min(limit);
        sieve.fill(low as u64, high as u64);

        // b ≤ c contributes nothing to S2; just keep the sieve state honest
        for b in 2..=c {
            let prime = primes[b as usize];
            let mut k = next[b as usize];
            while k < high {
                sieve.unset((k - low) as usize);
                k += prime * 2;
            }
            next[b as usize] = k;
        }
        counters.init(&sieve);

        'segment: {
            let mut b = c + 1;

            // Square-free leaves n = p_b·m, μ(m) ≠ 0, p_b < lpf(m)
            while b <= pi_sqrty {
                let prime = primes[b as usize];
                // Clamp in 128-bit before narrowing: x/(p·high) can exceed i64
                let min_m = ((x / (prime as i128 * high as i128)).min(y as i128) as i64)
                    .max(y / prime);
                let max_m = (x / (prime as i128 * low as i128)).min(y as i128) as i64;
                if prime >= max_m {
                    break 'segment;
                }

                let min_i = factors.to_index(min_m);
                let max_i = factors.to_index(max_m);
                for m in (min_i + 1..=max_i).rev() {
                    if prime < factors.lpf(m) {
                        let n = prime as i128 * factors.get_number(m) as i128;
                        let xn = (x / n) as i64;
                        let phi_xn = phi[b as usize] + counters.query((xn - low) as usize);
                        sum -= factors.mu(m) as i128 * phi_xn as i128;
                    }
                }

                phi[b as usize] += counters.query((high - 1 - low) as usize);
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }

            // Hard prime-pair leaves n = p_b·p_l
            while b <= pi_sqrtz {
                let prime = primes[b as usize];
                let mut l = pi[min3(
                    x / (prime as i128 * low as i128),
                    (z / prime) as i128,
                    y as i128,
                ) as usize] as i64;
                if prime >= primes[l as usize] {
                    break 'segment;
                }
                let min_hard = max3(
                    (x / (prime as i128 * high as i128)).min(y as i128) as i64,
                    y / prime,
                    prime,
                );

                while primes[l as usize] > min_hard {
                    let n = prime as i128 * primes[l as usize] as i128;
                    let xn = (x / n) as i64;
                    let phi_xn = phi[b as usize] + counters.query((xn - low) as usize);
                    sum += phi_xn as i128;
                    l -= 1;
                }

                phi[b as usize] += counters.query((high - 1 - low) as usize);
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }
        }

        low += segment_size;
    }
    sum
}
