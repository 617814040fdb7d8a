//! Per-parameter series pipeline
//!
//! Numeric columns go through filter -> sparsity -> fill. Categorical columns
//! skip the filter and can only be forward filled. Filling runs when a method
//! is selected and the column is sparse or filling is forced.

use super::gap_filler::{fill_categorical, fill_numeric};
use super::range_filter::apply_filters;
use super::sparsity::SparsityDetector;
use crate::app::models::{
    Dataset, FilterConfig, InterpolationMethod, ParameterMetadata, ParameterSeries, SeriesValues,
};
use crate::{Error, Result};
use tracing::debug;

/// Builds renderer-ready series from a dataset
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesBuilder {
    sparsity: SparsityDetector,
}

impl SeriesBuilder {
    pub fn new(sparsity_threshold: f64) -> Self {
        Self {
            sparsity: SparsityDetector::new(sparsity_threshold),
        }
    }

    /// Build the series for one parameter
    ///
    /// `metadata` should come from the same row set as `dataset.rows`.
    pub fn build(
        &self,
        dataset: &Dataset,
        name: &str,
        metadata: &ParameterMetadata,
        filter: &FilterConfig,
    ) -> Result<ParameterSeries> {
        if !dataset.has_parameter(name) {
            return Err(Error::unknown_parameter(name));
        }
        let column = dataset
            .column(name)
            .ok_or_else(|| Error::unknown_parameter(name))?;

        let should_fill = |is_sparse: bool| {
            filter.interpolation_method != InterpolationMethod::None
                && (is_sparse || filter.force_interpolation)
        };

        let (gaps, filled, is_sparse, filtered_count) = if metadata.is_numeric {
            let outcome = apply_filters(&column.numeric(), filter, metadata);
            let is_sparse = self.sparsity.is_sparse(&outcome.values);
            let filled = should_fill(is_sparse)
                .then(|| fill_numeric(&outcome.values, filter.interpolation_method))
                .map(SeriesValues::Numeric);
            (
                SeriesValues::Numeric(outcome.values),
                filled,
                is_sparse,
                outcome.removed,
            )
        } else {
            let raw = column.categorical();
            let is_sparse = self.sparsity.is_sparse(&raw);
            let filled = should_fill(is_sparse)
                .then(|| fill_categorical(&raw))
                .map(SeriesValues::Categorical);
            (SeriesValues::Categorical(raw), filled, is_sparse, 0)
        };

        let missing_before = gaps.missing_count();
        let missing_fraction = if gaps.is_empty() {
            0.0
        } else {
            missing_before as f64 / gaps.len() as f64
        };
        let values = filled.unwrap_or(gaps);
        let filled_count = missing_before - values.missing_count();

        debug!(
            "Series {}: {} points, sparse={}, {} filtered, {} filled",
            name,
            values.len(),
            is_sparse,
            filtered_count,
            filled_count
        );

        Ok(ParameterSeries {
            name: name.to_string(),
            unit: dataset.unit(name).to_string(),
            metadata: metadata.clone(),
            is_sparse,
            missing_fraction,
            values,
            filled_count,
            filtered_count,
            smooth: filter.smooth_interpolated && filled_count > 0,
        })
    }
}
