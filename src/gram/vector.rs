//! Hashed-histogram embedding of gram multisets.
//!
//! Each gram is hashed (xxh3 over its stable byte encoding) into one of
//! `dimension` buckets; structurally similar subtrees land close together
//! no matter how large they are. The embedding is approximate and lossy:
//! different grams may share a bucket, and two different subtrees can sit
//! at distance 0. That collision tolerance is the accepted trade-off for
//! speed — callers treat distances as a ranking signal, never as an
//! exact-match test.

use crate::gram::Gram;
use xxhash_rust::xxh3::xxh3_64;

/// Fixed-dimension numeric fingerprint of a gram multiset.
///
/// Two vectors are only meaningfully comparable when built with the same
/// dimension; [`FeatureVector::distance`] enforces that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    buckets: Vec<u32>,
}

impl FeatureVector {
    /// Build a vector from a gram multiset.
    ///
    /// Deterministic: identical multisets with the same dimension always
    /// produce identical vectors, across calls, runs and platforms. The
    /// empty multiset produces all zeros.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is zero (caller contract violation).
    pub fn build<'a, I>(grams: I, dimension: usize) -> Self
    where
        I: IntoIterator<Item = &'a Gram>,
    {
        assert!(dimension > 0, "feature vector dimension must be positive");
        let mut buckets = vec![0u32; dimension];
        let mut buf = Vec::with_capacity(16);
        for gram in grams {
            buf.clear();
            gram.write_bytes(&mut buf);
            let bucket = (xxh3_64(&buf) % dimension as u64) as usize;
            buckets[bucket] += 1;
        }
        Self { buckets }
    }

    pub fn dimension(&self) -> usize {
        self.buckets.len()
    }

    pub fn buckets(&self) -> &[u32] {
        &self.buckets
    }

    /// Total gram mass: every gram contributed exactly one increment, so
    /// this equals the multiset's cardinality.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|&b| u64::from(b)).sum()
    }

    /// Normalized L1 distance in `[0, 1]`: 0 for identical bucket
    /// profiles, 1 for fully disjoint ones. Independent of subtree size,
    /// which keeps one threshold meaningful across the whole tree.
    ///
    /// # Panics
    ///
    /// Panics if the two vectors were built with different dimensions.
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        assert_eq!(
            self.dimension(),
            other.dimension(),
            "cannot compare feature vectors of different dimensions"
        );
        let mass = self.total() + other.total();
        if mass == 0 {
            return 0.0;
        }
        let l1: u64 = self
            .buckets
            .iter()
            .zip(other.buckets.iter())
            .map(|(&a, &b)| u64::from(a.abs_diff(b)))
            .sum();
        l1 as f64 / mass as f64
    }
}
