//! # Counters — Fenwick Tree over Sieve Bits
//!
//! Prefix-popcount companion to the segmented [`crate::bit_sieve::BitSieve`]:
//! after `init`, `query(i)` returns the number of set bits in positions
//! [0, i] in O(log n), and `update(i)` records a single bit clear in
//! O(log n). The hard-leaves engine performs one query per special leaf and
//! one update per crossed-off sieve position, so both operations sit on the
//! innermost hot path.
//!
//! Standard binary-indexed tree, 1-based internally: node n covers the
//! `n & -n` positions ending at n.

use crate::bit_sieve::BitSieve;

pub struct Counters {
    tree: Vec<i32>,
}

impl Counters {
    pub fn new(len: usize) -> Self {
        Counters { tree: vec![0; len] }
    }

    /// Rebuild from a freshly filled sieve segment in O(n).
    pub fn init(&mut self, sieve: &BitSieve) {
        let len = self.tree.len();
        debug_assert!(len >= sieve.size());
        for i in 0..len {
            self.tree[i] = (i < sieve.size() && sieve.get(i)) as i32;
        }
        // Bottom-up accumulation: each node folds into its parent
        for n in 1..=len {
            let parent = n + (n & n.wrapping_neg());
            if parent <= len {
                self.tree[parent - 1] += self.tree[n - 1];
            }
        }
    }

    /// Count of set bits in positions [0, i].
    #[inline]
    pub fn query(&self, i: usize) -> i64 {
        let mut n = i + 1;
        let mut sum = 0i64;
        while n > 0 {
            sum += self.tree[n - 1] as i64;
            n -= n & n.wrapping_neg();
        }
        sum
    }

    /// Record that position i was cleared (call once per `unset`).
    #[inline]
    pub fn update(&mut self, i: usize) {
        let len = self.tree.len();
        let mut n = i + 1;
        while n <= len {
            self.tree[n - 1] -= 1;
            n += n & n.wrapping_neg();
        }
    }
}
