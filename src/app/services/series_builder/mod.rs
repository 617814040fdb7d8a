//! Series building for ingested flight data
//!
//! This module turns a sampled [`Dataset`] into per-parameter value series a
//! renderer can draw directly.
//!
//! ## Architecture
//!
//! - [`sampler`] - Bounded, endpoint-preserving row sampling
//! - [`analyzer`] - Numeric/categorical classification, states and range
//! - [`sparsity`] - Missing-fraction measurement and the sparse flag
//! - [`range_filter`] - Custom range and outlier rules
//! - [`gap_filler`] - Forward, backward and linear filling
//! - [`builder`] - The filter -> sparsity -> fill pipeline for one parameter
//!
//! Every component is a pure function of its inputs; none holds state
//! between calls.
//!
//! ## Usage
//!
//! ```rust
//! use flight_processor::app::services::flight_csv_parser::StreamIngestor;
//! use flight_processor::app::services::series_builder::{ParameterAnalyzer, SeriesBuilder};
//! use flight_processor::{FilterConfig, InterpolationMethod};
//!
//! # fn example() -> flight_processor::Result<()> {
//! let result = StreamIngestor::default().ingest_str("ALT\nft\n0\n\n\n30\n")?;
//! let dataset = result.dataset.sampled(10_000);
//!
//! let metadata = ParameterAnalyzer::default().analyze(&dataset.rows, "ALT");
//! let filter = FilterConfig {
//!     interpolation_method: InterpolationMethod::Linear,
//!     force_interpolation: true,
//!     ..FilterConfig::default()
//! };
//! let series = SeriesBuilder::default().build(&dataset, "ALT", &metadata, &filter)?;
//! assert_eq!(series.values.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! [`Dataset`]: crate::app::models::Dataset

pub mod analyzer;
pub mod builder;
pub mod gap_filler;
pub mod range_filter;
pub mod sampler;
pub mod sparsity;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use analyzer::{ParameterAnalyzer, analyze_parameters_parallel};
pub use builder::SeriesBuilder;
pub use gap_filler::{backward_fill, fill_categorical, fill_numeric, forward_fill, linear_fill};
pub use range_filter::{FilterOutcome, apply_filters};
pub use sampler::{sample, sample_indices, sample_owned};
pub use sparsity::{SparsityDetector, is_sparse, missing_fraction};
