//! Sparse feature vectors

use serde::{Deserialize, Serialize};

/// Fixed-dimension sparse vector with entries sorted by feature index.
///
/// Absent indices are zero. The dimension is the vocabulary size the vector
/// was produced against, so classifiers can reject vectors from a different
/// feature space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(u32, f64)>,
}

impl FeatureVector {
    /// Build from unordered `(index, value)` pairs. Duplicate indices are
    /// summed, zeros and out-of-range indices are dropped.
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut entries: Vec<(u32, f64)> = pairs
            .into_iter()
            .filter(|(idx, _)| (*idx as usize) < dim)
            .collect();
        entries.sort_unstable_by_key(|(idx, _)| *idx);

        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (idx, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == idx => *acc += value,
                _ => merged.push((idx, value)),
            }
        }
        merged.retain(|(_, v)| *v != 0.0);

        Self { dim, entries: merged }
    }

    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: u32) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(idx, _)| *idx)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn l2_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit L2 norm; the zero vector is left unchanged
    pub fn l2_normalize(&mut self) {
        let norm = self.l2_norm();
        if norm > 0.0 {
            for (_, v) in &mut self.entries {
                *v /= norm;
            }
        }
    }
}
