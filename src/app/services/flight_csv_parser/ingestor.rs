//! Streaming ingestion of flight recordings
//!
//! Lines are read one at a time from a [`BufRead`] source, so memory use is
//! bounded by the current batch plus the rows accepted so far. Progress and
//! cancellation checks happen at batch boundaries.

use super::header_classifier::{SecondLine, resolve_second_line};
use super::line_parser::{parse_line, parse_line_into};
use super::progress::{ProgressEvent, ProgressSink, processing_percent};
use super::stats::{IngestResult, IngestStats};
use crate::app::models::{ColumnIndex, Dataset, Row};
use crate::config::IngestConfig;
use crate::constants::progress::{
    COMPLETE, COMPLETE_MESSAGE, HEADERS_PARSING, PROCESSING_START, READING_DONE, READING_START,
};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const READ_BUFFER_CAPACITY: usize = 1 << 20;

const TOO_FEW_LINES: &str = "expected a header line followed by at least one units or data line";

/// Where the text comes from
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Name used in logs and errors
    pub label: String,
    /// Total size when known, used to scale progress
    pub total_bytes: Option<u64>,
}

impl SourceInfo {
    pub fn new(label: impl Into<String>, total_bytes: Option<u64>) -> Self {
        Self {
            label: label.into(),
            total_bytes,
        }
    }
}

/// Physical line reader that tracks line numbers and bytes consumed
struct LineReader<R> {
    reader: R,
    label: String,
    buffer: String,
    line_number: usize,
    bytes_consumed: u64,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R, label: &str) -> Self {
        Self {
            reader,
            label: label.to_string(),
            buffer: String::new(),
            line_number: 0,
            bytes_consumed: 0,
        }
    }

    /// Next physical line without its `\n` / `\r\n` terminator
    fn next_line(&mut self) -> Result<Option<(usize, &str)>> {
        self.buffer.clear();
        let read = self
            .reader
            .read_line(&mut self.buffer)
            .map_err(|e| Error::unreadable_source(self.label.clone(), e))?;

        if read == 0 {
            return Ok(None);
        }

        self.line_number += 1;
        self.bytes_consumed += read as u64;

        let line = self.buffer.strip_suffix('\n').unwrap_or(&self.buffer);
        let line = line.strip_suffix('\r').unwrap_or(line);
        Ok(Some((self.line_number, line)))
    }

    /// Next line that is not empty after trimming
    fn next_non_blank(&mut self, stats: &mut IngestStats) -> Result<Option<(usize, String)>> {
        while let Some((line_number, line)) = self.next_line()? {
            stats.lines_read += 1;
            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }
            return Ok(Some((line_number, line.to_string())));
        }
        Ok(None)
    }
}

/// Rows accumulated between progress checkpoints
struct Batch {
    rows: Vec<Row>,
    lines: usize,
}

impl Batch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            lines: 0,
        }
    }
}

/// Turns the raw text of a recording into a [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct StreamIngestor {
    config: IngestConfig,
}

impl StreamIngestor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest in-memory text without progress reporting
    pub fn ingest_str(&self, content: &str) -> Result<IngestResult> {
        self.ingest_str_with(content, &mut ProgressSink::disabled(), &CancellationToken::new())
    }

    /// Ingest in-memory text with progress and cancellation
    pub fn ingest_str_with(
        &self,
        content: &str,
        sink: &mut ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<IngestResult> {
        let source = SourceInfo::new("<memory>", Some(content.len() as u64));
        self.ingest_reader(content.as_bytes(), source, sink, cancel)
    }

    /// Ingest a file from disk, streaming it line by line
    pub fn ingest_path(
        &self,
        path: &Path,
        sink: &mut ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<IngestResult> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::unreadable_source(label.clone(), e))?;
        let total_bytes = file.metadata().ok().map(|metadata| metadata.len());

        let reader = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);
        self.ingest_reader(reader, SourceInfo::new(label, total_bytes), sink, cancel)
    }

    /// Ingest any buffered reader
    ///
    /// Fails with `MalformedFile` when fewer than two non-blank lines exist,
    /// `UnreadableSource` when reading fails, and `ProcessingInterrupted` when
    /// `cancel` fires. Data lines with the wrong field count are skipped.
    pub fn ingest_reader<R: BufRead>(
        &self,
        reader: R,
        source: SourceInfo,
        sink: &mut ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<IngestResult> {
        info!("Ingesting flight data from {}", source.label);
        sink.report(READING_START, "Reading file...");

        let mut stats = IngestStats::new();
        let mut lines = LineReader::new(reader, &source.label);

        let (_, header_line) = lines
            .next_non_blank(&mut stats)?
            .ok_or_else(|| Error::malformed_file(0, TOO_FEW_LINES))?;

        sink.report(HEADERS_PARSING, "Parsing headers...");
        let columns = Arc::new(ColumnIndex::new(parse_line(&header_line)));

        let (second_line_number, second_line) = lines
            .next_non_blank(&mut stats)?
            .ok_or_else(|| Error::malformed_file(1, TOO_FEW_LINES))?;
        let mut second_fields = parse_line(&second_line);

        let second = resolve_second_line(&second_fields, columns.len(), self.config.units_row);
        stats.units_detected = second == SecondLine::Units;

        let (headers, units) = match second {
            SecondLine::Units => self.parameters(&columns, Some(second_fields.as_slice())),
            SecondLine::Data => self.parameters(&columns, None),
        };

        debug!(
            "Header: {} columns, {} parameters, units row {}",
            columns.len(),
            headers.len(),
            if stats.units_detected { "detected" } else { "absent" }
        );
        sink.report(READING_DONE, format!("Detected {} parameters", headers.len()));
        sink.report(PROCESSING_START, "Processing records...");

        let batch_size = self.config.batch_size.max(1);
        let mut rows = Vec::new();
        let mut batch = Batch::with_capacity(batch_size);
        let mut fields = Vec::with_capacity(columns.len());

        if second == SecondLine::Data {
            push_record(
                second_line_number,
                &mut second_fields,
                &columns,
                &mut batch,
                &mut stats,
            );
        }

        while let Some((line_number, line)) = lines.next_line()? {
            stats.lines_read += 1;
            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }

            parse_line_into(line, &mut fields);
            push_record(line_number, &mut fields, &columns, &mut batch, &mut stats);

            if batch.lines >= batch_size {
                let percent = processing_percent(lines.bytes_consumed, source.total_bytes);
                flush_batch(&mut batch, &mut rows, &mut stats, sink, percent, cancel)?;
            }
        }

        if batch.lines > 0 {
            let percent = processing_percent(lines.bytes_consumed, source.total_bytes);
            flush_batch(&mut batch, &mut rows, &mut stats, sink, percent, cancel)?;
        }

        if rows.is_empty() && stats.rows_skipped > 0 && self.config.fail_on_empty {
            return Err(Error::no_usable_rows(stats.rows_skipped));
        }

        if stats.skip_rate() > self.config.skip_warning_ratio {
            warn!(
                "{} of {} data lines skipped in {} ({:.1}%), first at lines {:?}",
                stats.rows_skipped,
                stats.data_lines(),
                source.label,
                stats.skip_rate() * 100.0,
                &stats.skipped_lines[..stats.skipped_lines.len().min(5)]
            );
        }

        info!("{}", stats.summary());

        let dataset = Dataset {
            columns,
            headers,
            units,
            total_row_count: rows.len(),
            rows,
            original_byte_length: lines.bytes_consumed,
        };

        sink.report(COMPLETE, COMPLETE_MESSAGE);
        Ok(IngestResult::new(dataset, stats))
    }

    /// Parameter names and their units, in file order
    ///
    /// Reserved and unlabelled columns are excluded. A duplicated name is
    /// listed once, at the position its values are read from.
    fn parameters(
        &self,
        columns: &ColumnIndex,
        unit_fields: Option<&[String]>,
    ) -> (Vec<String>, Vec<String>) {
        columns
            .names()
            .iter()
            .enumerate()
            .filter(|(position, name)| {
                columns.position(name) == Some(*position) && !self.config.is_reserved(name)
            })
            .map(|(position, name)| {
                let unit = unit_fields
                    .and_then(|units| units.get(position))
                    .cloned()
                    .unwrap_or_default();
                (name.clone(), unit)
            })
            .unzip()
    }
}

/// Turn parsed fields into a row, or count the line as skipped
fn push_record(
    line_number: usize,
    fields: &mut Vec<String>,
    columns: &Arc<ColumnIndex>,
    batch: &mut Batch,
    stats: &mut IngestStats,
) {
    batch.lines += 1;

    if fields.len() != columns.len() {
        debug!(
            "Skipping line {}: expected {} fields, found {}",
            line_number,
            columns.len(),
            fields.len()
        );
        stats.record_skip(line_number);
        return;
    }

    batch
        .rows
        .push(Row::new(Arc::clone(columns), std::mem::take(fields)));
    stats.rows_accepted += 1;
}

/// Move a finished batch into the accumulated rows and report progress
fn flush_batch(
    batch: &mut Batch,
    rows: &mut Vec<Row>,
    stats: &mut IngestStats,
    sink: &mut ProgressSink,
    percent: u8,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        info!("Ingestion cancelled after {} rows", rows.len());
        return Err(Error::processing_interrupted(
            "Ingestion cancelled before completion",
        ));
    }

    rows.append(&mut batch.rows);
    stats.batches += 1;
    debug!(
        "Batch {} processed: {} lines, {} rows total",
        stats.batches,
        batch.lines,
        rows.len()
    );
    batch.lines = 0;

    sink.report(percent, "Processing records...");
    Ok(())
}

/// A background ingestion and its progress stream
pub struct IngestionHandle {
    pub progress: UnboundedReceiver<ProgressEvent>,
    pub task: JoinHandle<Result<IngestResult>>,
}

impl IngestionHandle {
    /// Wait for the result, ignoring progress
    pub async fn join(self) -> Result<IngestResult> {
        join_ingestion(self.task).await
    }
}

/// Await an ingestion task and flatten join failures into the crate error
pub async fn join_ingestion(task: JoinHandle<Result<IngestResult>>) -> Result<IngestResult> {
    task.await.map_err(|e| {
        Error::processing_interrupted(format!("Ingestion task did not complete: {}", e))
    })?
}

/// Ingest a file on the blocking thread pool
///
/// Must be called from within a tokio runtime. Dropping the progress receiver
/// is allowed; cancelling `cancel` abandons the work at the next batch.
pub fn spawn_ingestion(
    path: PathBuf,
    config: IngestConfig,
    cancel: CancellationToken,
) -> IngestionHandle {
    let (mut sink, progress) = ProgressSink::channel();

    let task = tokio::task::spawn_blocking(move || {
        StreamIngestor::new(config).ingest_path(&path, &mut sink, &cancel)
    });

    IngestionHandle { progress, task }
}
