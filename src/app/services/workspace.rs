//! Caller-owned dataset state
//!
//! A [`Workspace`] holds the current sampled dataset together with a metadata
//! cache tagged by dataset version. Loading a new dataset bumps the version and
//! invalidates the cache; a failed ingestion leaves everything untouched.

use crate::app::models::{Dataset, FilterConfig, ParameterMetadata, ParameterSeries, Row};
use crate::app::services::flight_csv_parser::{
    IngestResult, IngestStats, ProgressEvent, spawn_ingestion,
};
use crate::app::services::series_builder::{
    ParameterAnalyzer, SeriesBuilder, analyze_parameters_parallel,
};
use crate::config::Config;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Parameter metadata computed for one dataset version
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    version: u64,
    entries: HashMap<String, ParameterMetadata>,
}

impl MetadataCache {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entries: HashMap::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&ParameterMetadata> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> &HashMap<String, ParameterMetadata> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current dataset, its version and cached analysis
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    config: Config,
    dataset: Option<Dataset>,
    stats: Option<IngestStats>,
    version: u64,
    cache: MetadataCache,
}

impl Workspace {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Statistics of the ingestion that produced the current dataset
    pub fn stats(&self) -> Option<&IngestStats> {
        self.stats.as_ref()
    }

    /// Incremented every time a dataset is loaded or cleared
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    fn analyzer(&self) -> ParameterAnalyzer {
        ParameterAnalyzer::new(self.config.analysis.numeric_ratio_threshold)
    }

    fn builder(&self) -> SeriesBuilder {
        SeriesBuilder::new(self.config.analysis.sparsity_threshold)
    }

    /// Replace the current dataset with a sampled copy of a successful ingestion
    pub fn load(&mut self, result: IngestResult) -> &Dataset {
        let IngestResult { dataset, stats } = result;
        let dataset = dataset.into_sampled(self.config.sampling.target_rows);

        self.version += 1;
        self.cache = MetadataCache::new(self.version);
        self.stats = Some(stats);

        info!(
            "Loaded dataset version {}: {} parameters, {} of {} rows kept",
            self.version,
            dataset.headers.len(),
            dataset.sampled_row_count(),
            dataset.total_row_count
        );
        self.dataset.insert(dataset)
    }

    /// Ingest a file in the background and load it on success
    ///
    /// Progress events are passed to `on_progress` in order. On any error the
    /// previously loaded dataset stays current.
    pub async fn ingest_file<F>(
        &mut self,
        path: &Path,
        cancel: CancellationToken,
        mut on_progress: F,
    ) -> Result<&Dataset>
    where
        F: FnMut(&ProgressEvent),
    {
        let mut handle = spawn_ingestion(path.to_path_buf(), self.config.ingest.clone(), cancel);

        while let Some(event) = handle.progress.recv().await {
            on_progress(&event);
        }

        let result = handle.join().await?;
        Ok(self.load(result))
    }

    /// Metadata for one parameter, computed once per dataset version
    pub fn metadata(&mut self, name: &str) -> Result<&ParameterMetadata> {
        let dataset = self
            .dataset
            .as_ref()
            .filter(|dataset| dataset.has_parameter(name))
            .ok_or_else(|| Error::unknown_parameter(name))?;

        if !self.cache.entries.contains_key(name) {
            debug!("Metadata cache miss for {} (version {})", name, self.version);
            let metadata = self.analyzer().analyze(&dataset.rows, name);
            self.cache.entries.insert(name.to_string(), metadata);
        }

        self.cache
            .get(name)
            .ok_or_else(|| Error::unknown_parameter(name))
    }

    /// Metadata for every parameter, analysing uncached ones concurrently
    pub async fn analyze_all(&mut self) -> Result<&HashMap<String, ParameterMetadata>> {
        if let Some(dataset) = &self.dataset {
            let missing: Vec<String> = dataset
                .headers
                .iter()
                .filter(|name| !self.cache.entries.contains_key(name.as_str()))
                .cloned()
                .collect();

            if !missing.is_empty() {
                let rows: Arc<[Row]> = dataset.rows.clone().into();
                let computed = analyze_parameters_parallel(
                    self.analyzer(),
                    rows,
                    missing,
                    self.config.analysis.parallel_workers,
                )
                .await?;
                self.cache.entries.extend(computed);
            }
        }

        Ok(self.cache.entries())
    }

    /// Series for a parameter using the configured filter for it
    pub fn series(&mut self, name: &str) -> Result<ParameterSeries> {
        let filter = self.config.filters.for_parameter(name).clone();
        self.series_with(name, &filter)
    }

    /// Series for a parameter with an explicit filter configuration
    pub fn series_with(&mut self, name: &str, filter: &FilterConfig) -> Result<ParameterSeries> {
        let metadata = self.metadata(name)?.clone();
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| Error::unknown_parameter(name))?;
        self.builder().build(dataset, name, &metadata, filter)
    }

    /// Drop the dataset and all cached analysis
    pub fn clear(&mut self) {
        self.dataset = None;
        self.stats = None;
        self.version += 1;
        self.cache = MetadataCache::new(self.version);
        debug!("Workspace cleared (version {})", self.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{InterpolationMethod, SeriesValues};
    use crate::app::services::flight_csv_parser::StreamIngestor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const RECORDING: &str = "Time,ALT,GEAR\ns,ft,\n0,100,UP\n1,,\n2,300,DOWN\n";

    fn ingest(content: &str) -> IngestResult {
        StreamIngestor::default().ingest_str(content).unwrap()
    }

    #[test]
    fn test_load_bumps_version_and_samples() {
        let mut content = String::from("ALT\n");
        for i in 0..100 {
            content.push_str(&format!("{}\n", i));
        }

        let mut workspace = Workspace::new(Config::default().with_target_rows(10));
        let dataset = workspace.load(ingest(&content));
        assert!(dataset.sampled_row_count() <= 10);
        assert_eq!(dataset.total_row_count, 100);
        assert_eq!(workspace.version(), 1);
        assert_eq!(workspace.stats().map(|stats| stats.rows_accepted), Some(100));
    }

    #[test]
    fn test_metadata_is_memoized_per_version() {
        let mut workspace = Workspace::default();
        workspace.load(ingest(RECORDING));

        assert!(workspace.metadata("ALT").unwrap().is_numeric);
        assert!(!workspace.metadata("GEAR").unwrap().is_numeric);
        assert_eq!(workspace.cache().len(), 2);
        assert_eq!(workspace.cache().version(), 1);

        workspace.load(ingest(RECORDING));
        assert!(workspace.cache().is_empty());
        assert_eq!(workspace.cache().version(), 2);
    }

    #[test]
    fn test_unknown_parameter() {
        let mut workspace = Workspace::default();
        assert!(matches!(
            workspace.metadata("ALT"),
            Err(Error::UnknownParameter { .. })
        ));

        workspace.load(ingest(RECORDING));
        assert!(matches!(
            workspace.series("Time"),
            Err(Error::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_series_uses_per_parameter_filter() {
        let mut config = Config::default();
        config.filters.per_parameter.insert(
            "ALT".to_string(),
            FilterConfig {
                interpolation_method: InterpolationMethod::Linear,
                ..FilterConfig::default()
            },
        );

        let mut workspace = Workspace::new(config);
        workspace.load(ingest(RECORDING));

        let series = workspace.series("ALT").unwrap();
        assert_eq!(
            series.values,
            SeriesValues::Numeric(vec![Some(100.0), Some(200.0), Some(300.0)])
        );
    }

    #[test]
    fn test_clear() {
        let mut workspace = Workspace::default();
        workspace.load(ingest(RECORDING));
        workspace.metadata("ALT").unwrap();

        workspace.clear();
        assert!(workspace.dataset().is_none());
        assert!(workspace.cache().is_empty());
        assert_eq!(workspace.version(), 2);
    }

    #[tokio::test]
    async fn test_analyze_all() {
        let mut workspace = Workspace::default();
        assert!(workspace.analyze_all().await.unwrap().is_empty());

        workspace.load(ingest(RECORDING));
        let metadata = workspace.analyze_all().await.unwrap();
        assert_eq!(metadata.len(), 2);
        assert!(metadata.contains_key("GEAR"));
    }

    #[tokio::test]
    async fn test_failed_ingestion_keeps_current_dataset() {
        let mut workspace = Workspace::default();
        workspace.load(ingest(RECORDING));

        let mut bad = NamedTempFile::new().unwrap();
        bad.write_all(b"ONLY_A_HEADER\n").unwrap();

        let result = workspace
            .ingest_file(bad.path(), CancellationToken::new(), |_| {})
            .await;
        assert!(matches!(result, Err(Error::MalformedFile { .. })));
        assert_eq!(workspace.version(), 1);
        assert_eq!(workspace.dataset().map(|dataset| dataset.rows.len()), Some(3));
    }

    #[tokio::test]
    async fn test_ingest_file_reports_progress() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(RECORDING.as_bytes()).unwrap();

        let mut workspace = Workspace::default();
        let mut last = None;
        let dataset = workspace
            .ingest_file(file.path(), CancellationToken::new(), |event| {
                last = Some(event.clone())
            })
            .await
            .unwrap();

        assert_eq!(dataset.headers, vec!["ALT", "GEAR"]);
        assert_eq!(last.map(|event| event.percent), Some(100));
    }
}
