//! Tabular file writers
//!
//! CSV and Parquet go through an Arrow RecordBatch; JSON Lines is written
//! straight from the rows so cells keep their JSON types.

use super::schema::dataset_to_record_batch;
use crate::error::{Error, Result};
use crate::flatten::FlatDataset;
use crate::types::JsonObject;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// Apache Parquet
    Parquet,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            "jsonl" | "ndjson" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Jsonl => "jsonl",
        };
        f.write_str(name)
    }
}

/// Parquet column compression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    /// zstd at its default level
    Zstd,
    #[serde(alias = "none")]
    Uncompressed,
}

impl ParquetCompression {
    fn codec(self) -> Compression {
        match self {
            Self::Snappy => Compression::SNAPPY,
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Parquet compression and row grouping (`output.parquet` in the job file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetWriterConfig {
    /// Column compression
    pub compression: ParquetCompression,
    /// Rows per row group
    pub row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: 64 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression.codec())
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Write a dataset in the given format, returning the number of rows written
pub fn write_dataset(
    dataset: &FlatDataset,
    path: impl AsRef<Path>,
    format: OutputFormat,
    parquet: &ParquetWriterConfig,
) -> Result<usize> {
    let path = path.as_ref();
    let rows = match format {
        OutputFormat::Csv => write_csv(dataset, path)?,
        OutputFormat::Parquet => write_parquet(dataset, path, parquet)?,
        OutputFormat::Jsonl => write_jsonl(dataset, path)?,
    };
    info!(
        path = %path.display(),
        %format,
        rows,
        columns = dataset.schema().len(),
        "dataset written"
    );
    Ok(rows)
}

/// Write a dataset as CSV with a header row; empty cells are left blank
pub fn write_csv(dataset: &FlatDataset, path: impl AsRef<Path>) -> Result<usize> {
    let batch = dataset_to_record_batch(dataset)?;
    let file = create(path.as_ref())?;

    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(file);
    writer.write(&batch)?;
    Ok(batch.num_rows())
}

/// Write a dataset as a Parquet file
pub fn write_parquet(
    dataset: &FlatDataset,
    path: impl AsRef<Path>,
    config: &ParquetWriterConfig,
) -> Result<usize> {
    let batch = dataset_to_record_batch(dataset)?;
    let file = create(path.as_ref())?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(config.build_properties()))
        .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;
    Ok(batch.num_rows())
}

/// Write a dataset as JSON Lines, one object per row in column order
pub fn write_jsonl(dataset: &FlatDataset, path: impl AsRef<Path>) -> Result<usize> {
    let mut writer = BufWriter::new(create(path.as_ref())?);

    for row in dataset.rows() {
        let object: JsonObject = dataset
            .columns()
            .iter()
            .zip(row)
            .map(|(column, cell)| (column.clone(), cell.to_json()))
            .collect();
        serde_json::to_writer(&mut writer, &object)
            .map_err(|e| Error::output(format!("Failed to encode row: {e}")))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(dataset.len())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
        .map_err(|e| Error::output(format!("Failed to create {}: {e}", path.display())))
}
