//! Range and outlier filtering for numeric columns
//!
//! Both rules only turn values into missing points. The outlier rule measures
//! distance from the midpoint of the parameter's `[min, max]` range, not from
//! the sample mean; the two differ for skewed data and the midpoint is kept
//! deliberately.

use crate::app::models::{FilterConfig, ParameterMetadata};

/// A filtered column and how many values the rules removed
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub values: Vec<Option<f64>>,
    pub removed: usize,
}

/// Whether a single value survives the enabled rules
fn keeps(value: f64, filter: &FilterConfig, metadata: &ParameterMetadata) -> bool {
    if filter.use_custom_range && !filter.custom_range.contains(value) {
        return false;
    }

    if filter.remove_outliers {
        let threshold = metadata.range() * (filter.outlier_threshold / 100.0);
        if (value - metadata.midpoint()).abs() > threshold {
            return false;
        }
    }

    true
}

/// Apply the range and outlier rules when filtering is enabled
///
/// With `enable_filtering` off the column is returned unchanged.
pub fn apply_filters(
    values: &[Option<f64>],
    filter: &FilterConfig,
    metadata: &ParameterMetadata,
) -> FilterOutcome {
    if !filter.enable_filtering {
        return FilterOutcome {
            values: values.to_vec(),
            removed: 0,
        };
    }

    let mut removed = 0;
    let values = values
        .iter()
        .map(|value| match value {
            Some(value) if !keeps(*value, filter, metadata) => {
                removed += 1;
                None
            }
            other => *other,
        })
        .collect();

    FilterOutcome { values, removed }
}
