//! Tests for the series builder module
//!
//! Property tests for sampling, classification, sparsity, filtering and gap
//! filling, plus the per-parameter pipeline over ingested datasets.


use crate::app::models::{ColumnIndex, Dataset, Row};
use crate::app::services::flight_csv_parser::StreamIngestor;
use std::sync::Arc;

/// Ingest an in-memory recording, panicking on failure
pub fn dataset(content: &str) -> Dataset {
    StreamIngestor::default()
        .ingest_str(content)
        .expect("test recording should ingest")
        .dataset
}

/// Rows of a single column named `name`
pub fn single_column_rows(name: &str, values: &[&str]) -> Vec<Row> {
    let columns = Arc::new(ColumnIndex::new(vec![name.to_string()]));
    values
        .iter()
        .map(|value| Row::new(Arc::clone(&columns), vec![value.to_string()]))
        .collect()
}

/// Turn a compact pattern into an optional column: `_` is missing
pub fn column(pattern: &[&str]) -> Vec<Option<f64>> {
    pattern
        .iter()
        .map(|value| match *value {
            "_" => None,
            number => Some(number.parse().expect("numeric test value")),
        })
        .collect()
}
