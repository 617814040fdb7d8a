//! Per-parameter classification and range statistics
//!
//! Analysis is a pure function of (row set, parameter name). The analyzer
//! keeps no cache; callers memoize per dataset version (see `Workspace`).

use crate::app::models::{Column, Dataset, ParameterMetadata, Row, parse_number};
use crate::constants::{DEFAULT_MAX, DEFAULT_MIN, NUMERIC_RATIO_THRESHOLD};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

/// Computes [`ParameterMetadata`] for columns of a row set
#[derive(Debug, Clone, Copy)]
pub struct ParameterAnalyzer {
    numeric_ratio_threshold: f64,
}

impl Default for ParameterAnalyzer {
    fn default() -> Self {
        Self::new(NUMERIC_RATIO_THRESHOLD)
    }
}

impl ParameterAnalyzer {
    /// `numeric_ratio_threshold` is compared with a strict `>`
    pub fn new(numeric_ratio_threshold: f64) -> Self {
        Self {
            numeric_ratio_threshold,
        }
    }

    pub fn numeric_ratio_threshold(&self) -> f64 {
        self.numeric_ratio_threshold
    }

    /// Analyze one column of raw values
    ///
    /// A column with no non-empty values counts as numeric. `states` is always
    /// filled, so a numeric parameter still exposes its distinct raw values.
    pub fn analyze_column(&self, column: &Column<'_>) -> ParameterMetadata {
        let mut non_empty = 0usize;
        let mut numeric = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut states = BTreeSet::new();

        for raw in column.values() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            non_empty += 1;
            states.insert(raw);

            if let Some(value) = parse_number(raw) {
                numeric += 1;
                min = min.min(value);
                max = max.max(value);
            }
        }

        let is_numeric =
            non_empty == 0 || numeric as f64 / non_empty as f64 > self.numeric_ratio_threshold;

        let (min, max) = if numeric == 0 {
            (DEFAULT_MIN, DEFAULT_MAX)
        } else {
            (min, max)
        };

        ParameterMetadata {
            is_numeric,
            states: states.into_iter().map(str::to_string).collect(),
            min,
            max,
        }
    }

    /// Analyze one parameter over a row set
    pub fn analyze(&self, rows: &[Row], name: &str) -> ParameterMetadata {
        let column = Column::new(rows.iter().map(|row| row.get(name).unwrap_or("")).collect());
        self.analyze_column(&column)
    }

    /// Analyze every parameter of a dataset sequentially
    pub fn analyze_all(&self, dataset: &Dataset) -> HashMap<String, ParameterMetadata> {
        dataset
            .headers
            .iter()
            .map(|name| (name.clone(), self.analyze(&dataset.rows, name)))
            .collect()
    }
}

/// Analyze parameters concurrently on the blocking pool
///
/// At most `workers` columns are analyzed at once. Rows are shared read-only.
pub async fn analyze_parameters_parallel(
    analyzer: ParameterAnalyzer,
    rows: Arc<[Row]>,
    names: Vec<String>,
    workers: usize,
) -> Result<HashMap<String, ParameterMetadata>> {
    let workers = workers.max(1);
    info!(
        "Analyzing {} parameters over {} rows with {} workers",
        names.len(),
        rows.len(),
        workers
    );

    let results: Vec<Result<(String, ParameterMetadata)>> = stream::iter(names)
        .map(|name| {
            let rows = Arc::clone(&rows);
            async move {
                task::spawn_blocking(move || {
                    let metadata = analyzer.analyze(&rows, &name);
                    (name, metadata)
                })
                .await
                .map_err(|e| {
                    Error::processing_interrupted(format!("Analysis task did not complete: {}", e))
                })
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut metadata = HashMap::with_capacity(results.len());
    for result in results {
        let (name, parameter) = result?;
        debug!(
            "{}: numeric={} range=[{}, {}] states={}",
            name,
            parameter.is_numeric,
            parameter.min,
            parameter.max,
            parameter.states.len()
        );
        metadata.insert(name, parameter);
    }

    Ok(metadata)
}
