//! Sparse parameter detection
//!
//! Sparsity is measured against whatever row set is active, so a column that
//! was range-filtered first counts its filtered points as missing.

use crate::constants::SPARSITY_THRESHOLD;

/// Fraction of missing entries, 0 for an empty column
pub fn missing_fraction<T>(values: &[Option<T>]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let missing = values.iter().filter(|value| value.is_none()).count();
    missing as f64 / values.len() as f64
}

/// Flags columns whose missing fraction exceeds a threshold
#[derive(Debug, Clone, Copy)]
pub struct SparsityDetector {
    threshold: f64,
}

impl Default for SparsityDetector {
    fn default() -> Self {
        Self::new(SPARSITY_THRESHOLD)
    }
}

impl SparsityDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly more than `threshold` of the entries are missing
    pub fn is_sparse<T>(&self, values: &[Option<T>]) -> bool {
        missing_fraction(values) > self.threshold
    }
}

/// [`SparsityDetector::is_sparse`] with the default threshold
pub fn is_sparse<T>(values: &[Option<T>]) -> bool {
    SparsityDetector::default().is_sparse(values)
}
