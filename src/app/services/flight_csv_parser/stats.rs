//! Ingestion statistics and result structures
//!
//! Tracks line and row counts for one ingestion so callers can report skip
//! rates without the ingestor treating skipped rows as errors.

use crate::app::models::Dataset;

/// Maximum skipped line numbers retained for diagnostics
const MAX_RECORDED_SKIPS: usize = 100;

/// Counters collected while ingesting one source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    /// Physical lines read, blank ones included
    pub lines_read: usize,
    /// Lines dropped because they were empty after trimming
    pub blank_lines: usize,
    /// Data lines turned into rows
    pub rows_accepted: usize,
    /// Data lines dropped for a field count mismatch
    pub rows_skipped: usize,
    /// Batches processed
    pub batches: usize,
    /// Whether the second line was used as units
    pub units_detected: bool,
    /// 1-based line numbers of the first skipped lines
    pub skipped_lines: Vec<usize>,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped data line
    pub fn record_skip(&mut self, line_number: usize) {
        self.rows_skipped += 1;
        if self.skipped_lines.len() < MAX_RECORDED_SKIPS {
            self.skipped_lines.push(line_number);
        }
    }

    /// Data lines seen (accepted + skipped)
    pub fn data_lines(&self) -> usize {
        self.rows_accepted + self.rows_skipped
    }

    /// Fraction of data lines skipped
    pub fn skip_rate(&self) -> f64 {
        if self.data_lines() == 0 {
            0.0
        } else {
            self.rows_skipped as f64 / self.data_lines() as f64
        }
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Ingestion Summary: {} lines read ({} blank) | {} rows accepted | {} skipped ({:.2}%) | {} batches | units row: {}",
            self.lines_read,
            self.blank_lines,
            self.rows_accepted,
            self.rows_skipped,
            self.skip_rate() * 100.0,
            self.batches,
            if self.units_detected { "yes" } else { "no" }
        )
    }
}

/// Dataset produced by an ingestion together with its statistics
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub dataset: Dataset,
    pub stats: IngestStats,
}

impl IngestResult {
    pub fn new(dataset: Dataset, stats: IngestStats) -> Self {
        Self { dataset, stats }
    }

    pub fn row_count(&self) -> usize {
        self.dataset.rows.len()
    }
}
