//! Data models for flight data processing
//!
//! This module contains the core data structures shared by the ingestion and
//! analysis services: immutable rows, the ingested dataset, per-parameter
//! metadata, filter configuration and the renderer-agnostic value series.

use crate::app::services::series_builder::sampler;
use crate::constants::{DEFAULT_MAX, DEFAULT_MIN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// Rows and Columns
// =============================================================================

/// Ordered column names of a recording with a name -> position lookup
///
/// Shared by every [`Row`] of a dataset so rows only carry their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Build an index from the header fields in file order
    ///
    /// When a name appears more than once the last occurrence wins lookups.
    pub fn new(names: Vec<String>) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .map(|(position, name)| (name.clone(), position))
            .collect();
        Self { names, positions }
    }

    /// Column names in file order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position used to resolve `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One observation across all columns at a single sample index
///
/// Rows are immutable once created by the ingestor. Values are raw strings,
/// possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<ColumnIndex>,
    values: Box<[String]>,
}

impl Row {
    /// Zip the column names with parsed field values
    ///
    /// Missing trailing fields default to the empty string and surplus fields
    /// are dropped, so a row always has exactly one value per column.
    pub fn new(columns: Arc<ColumnIndex>, mut values: Vec<String>) -> Self {
        values.resize(columns.len(), String::new());
        Self {
            columns,
            values: values.into_boxed_slice(),
        }
    }

    /// Raw value for a column name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .position(name)
            .and_then(|position| self.value_at(position))
    }

    /// Raw value at a column position
    pub fn value_at(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    /// Iterate `(column name, raw value)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn columns(&self) -> &Arc<ColumnIndex> {
        &self.columns
    }
}

/// Parse a raw value as a finite number
///
/// The whole trimmed field must be a number; `NaN` and infinities are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// One parameter's raw values across a row set, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    values: Vec<&'a str>,
}

impl<'a> Column<'a> {
    pub fn new(values: Vec<&'a str>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[&'a str] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coerce to numbers; empty and non-numeric values become missing
    pub fn numeric(&self) -> Vec<Option<f64>> {
        self.values.iter().map(|raw| parse_number(raw)).collect()
    }

    /// Keep raw states; empty values become missing
    pub fn categorical(&self) -> Vec<Option<String>> {
        self.values
            .iter()
            .map(|raw| {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// An ingested recording
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Every column name of the file, in order
    pub columns: Arc<ColumnIndex>,

    /// Parameter names: `columns` minus reserved index/time/phase columns
    pub headers: Vec<String>,

    /// Units aligned one-to-one with `headers` (empty strings when no units row)
    pub units: Vec<String>,

    /// Accepted rows, in file order
    pub rows: Vec<Row>,

    /// Row count before any sampling
    pub total_row_count: usize,

    /// Size of the source in bytes
    pub original_byte_length: u64,
}

impl Dataset {
    /// Number of rows currently held (after sampling, if any)
    pub fn sampled_row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether `name` is one of the dataset's parameters
    pub fn has_parameter(&self, name: &str) -> bool {
        self.headers.iter().any(|header| header == name)
    }

    /// Unit for a parameter, empty when unknown
    pub fn unit(&self, name: &str) -> &str {
        self.headers
            .iter()
            .position(|header| header == name)
            .and_then(|position| self.units.get(position))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Derive the column of raw values for a column name
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        let position = self.columns.position(name)?;
        Some(Column::new(
            self.rows
                .iter()
                .map(|row| row.value_at(position).unwrap_or(""))
                .collect(),
        ))
    }

    /// Raw values of `name` coerced to numbers, or `None` for an unknown column
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name).map(|column| column.numeric())
    }

    /// Raw values of `name` as categorical states, or `None` for an unknown column
    pub fn categorical_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        self.column(name).map(|column| column.categorical())
    }

    /// Copy of the dataset sampled down to about `target` rows, keeping the original total row count
    pub fn sampled(&self, target: usize) -> Self {
        Self {
            rows: sampler::sample(&self.rows, target),
            ..self.clone_without_rows()
        }
    }

    /// Reduce the rows to about `target` while keeping the total row count
    pub fn into_sampled(self, target: usize) -> Self {
        let rows = sampler::sample_owned(self.rows, target);
        Self { rows, ..self }
    }

    fn clone_without_rows(&self) -> Self {
        Self {
            columns: Arc::clone(&self.columns),
            headers: self.headers.clone(),
            units: self.units.clone(),
            rows: Vec::new(),
            total_row_count: self.total_row_count,
            original_byte_length: self.original_byte_length,
        }
    }
}

// =============================================================================
// Parameter Metadata
// =============================================================================

/// Classification and range of one parameter over a row set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// More than the threshold share of non-empty values are numbers
    pub is_numeric: bool,

    /// Distinct non-empty raw values, sorted
    pub states: Vec<String>,

    /// Minimum over numeric values (0 when there are none)
    pub min: f64,

    /// Maximum over numeric values (1 when there are none)
    pub max: f64,
}

impl Default for ParameterMetadata {
    fn default() -> Self {
        Self {
            is_numeric: true,
            states: Vec::new(),
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl ParameterMetadata {
    /// Midpoint of the numeric range
    pub fn midpoint(&self) -> f64 {
        (self.max + self.min) / 2.0
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

// =============================================================================
// Filter Configuration
// =============================================================================

/// Gap-filling strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Propagate the last known value forward
    #[default]
    Forward,
    /// Interpolate linearly between neighbouring known values
    Linear,
    /// Propagate the next known value backward
    Backward,
    /// Leave gaps in place
    None,
}

impl InterpolationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Linear => "linear",
            Self::Backward => "backward",
            Self::None => "none",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" | "ffill" => Ok(Self::Forward),
            "linear" => Ok(Self::Linear),
            "backward" | "bfill" => Ok(Self::Backward),
            "none" => Ok(Self::None),
            other => Err(format!(
                "Invalid interpolation method '{}' (expected forward, linear, backward or none)",
                other
            )),
        }
    }
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomRange {
    pub min: f64,
    pub max: f64,
}

impl Default for CustomRange {
    fn default() -> Self {
        Self { min: 0.0, max: 100.0 }
    }
}

impl CustomRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-parameter filtering and gap-filling options, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Master switch for range and outlier rules
    pub enable_filtering: bool,

    /// Range applied when `use_custom_range` is set
    pub custom_range: CustomRange,
    pub use_custom_range: bool,

    /// Null values further than `outlier_threshold` percent of the range from its midpoint
    pub remove_outliers: bool,
    pub outlier_threshold: f64,

    pub interpolation_method: InterpolationMethod,

    /// Fill gaps even when the parameter is not sparse
    pub force_interpolation: bool,

    /// Renderer hint: draw filled segments smoothed
    pub smooth_interpolated: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enable_filtering: false,
            custom_range: CustomRange::default(),
            use_custom_range: false,
            remove_outliers: false,
            outlier_threshold: 50.0,
            interpolation_method: InterpolationMethod::Forward,
            force_interpolation: false,
            smooth_interpolated: false,
        }
    }
}

// =============================================================================
// Value Series
// =============================================================================

/// Values of one parameter, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum SeriesValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing points
    pub fn missing_count(&self) -> usize {
        match self {
            Self::Numeric(values) => values.iter().filter(|value| value.is_none()).count(),
            Self::Categorical(values) => values.iter().filter(|value| value.is_none()).count(),
        }
    }

    /// Render the point at `index` as text, empty when missing
    pub fn display_at(&self, index: usize) -> String {
        match self {
            Self::Numeric(values) => values
                .get(index)
                .copied()
                .flatten()
                .map(|value| value.to_string())
                .unwrap_or_default(),
            Self::Categorical(values) => values
                .get(index)
                .cloned()
                .flatten()
                .unwrap_or_default(),
        }
    }
}

/// One parameter after filtering, sparsity detection and gap filling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSeries {
    pub name: String,
    pub unit: String,
    pub metadata: ParameterMetadata,
    pub is_sparse: bool,
    pub missing_fraction: f64,
    pub values: SeriesValues,
    /// Points that were missing and received a filled value
    pub filled_count: usize,
    /// Points nulled by the range or outlier rule
    pub filtered_count: usize,
    /// Renderer hint copied from `smooth_interpolated` when anything was filled
    pub smooth: bool,
}
