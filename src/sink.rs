//! Table output.
//!
//! [`ParquetDirSink`] writes each table into its own `<name>.parquet`
//! directory under the output base, replacing whatever was there before.
//! Partitioned tables use a Hive layout:
//!
//! ```text
//! <output>/time.parquet/year=2018/month=11/part-00000.parquet
//! ```
//!
//! The partition columns are carried by the directory names and are not
//! repeated inside the files. Files are written one at a time, so a run that
//! fails part-way can leave some partitions rewritten and others stale.

use crate::error::{EtlError, Result, ResultExt as _};
use crate::schema::TableSpec;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Directory name used for a null partition value.
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// File name of the single file written per (partition) directory.
pub const PART_FILE: &str = "part-00000.parquet";

/// Environment variable that overrides the configured row group size.
pub const ROW_GROUP_SIZE_ENV: &str = "SPARKIFY_PARQUET_ROW_GROUP_SIZE";

/// Parquet compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Lz4,
    Gzip,
    Uncompressed,
}

impl From<Compression> for ParquetCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Snappy => Self::Snappy,
            Compression::Zstd => Self::Zstd(None),
            Compression::Lz4 => Self::Lz4Raw,
            Compression::Gzip => Self::Gzip(None),
            Compression::Uncompressed => Self::Uncompressed,
        }
    }
}

/// Parquet writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetOptions {
    pub compression: Compression,
    /// Rows per row group
    pub row_group_size: usize,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 65_536,
        }
    }
}

impl ParquetOptions {
    /// Row group size after applying the environment override, if any.
    pub fn effective_row_group_size(&self) -> usize {
        std::env::var(ROW_GROUP_SIZE_ENV)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.row_group_size)
    }
}

/// What a table write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWriteSummary {
    pub table: &'static str,
    pub rows: usize,
    /// Number of partition directories (0 for an unpartitioned table)
    pub partitions: usize,
    pub location: PathBuf,
}

/// Destination for finished tables.
pub trait TableSink: Send + Sync {
    /// Replace the previous contents of `table` with `df`.
    fn write_table(&self, table: &TableSpec, df: &mut DataFrame) -> Result<TableWriteSummary>;
}

/// Parquet directories under a local (or mounted) base path.
#[derive(Debug, Clone)]
pub struct ParquetDirSink {
    output_base: PathBuf,
    options: ParquetOptions,
}

impl ParquetDirSink {
    pub fn new(output_base: impl Into<PathBuf>, options: ParquetOptions) -> Self {
        Self {
            output_base: output_base.into(),
            options,
        }
    }

    pub fn table_dir(&self, table: &TableSpec) -> PathBuf {
        self.output_base.join(table.dir_name())
    }

    fn write_file(&self, path: &Path, df: &mut DataFrame) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .write_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = std::fs::File::create(path)
            .write_context(|| format!("Failed to create {}", path.display()))?;
        ParquetWriter::new(file)
            .with_compression(self.options.compression.into())
            .with_row_group_size(Some(self.options.effective_row_group_size()))
            .finish(df)
            .write_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

impl TableSink for ParquetDirSink {
    fn write_table(&self, table: &TableSpec, df: &mut DataFrame) -> Result<TableWriteSummary> {
        let dir = self.table_dir(table);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .write_context(|| format!("Failed to clear {}", dir.display()))?;
        }
        std::fs::create_dir_all(&dir)
            .write_context(|| format!("Failed to create {}", dir.display()))?;

        let rows = df.height();
        let mut partitions = 0;

        if table.is_partitioned() {
            let parts = df
                .partition_by_stable(table.partition_by.iter().copied(), true)
                .write_context(|| format!("Failed to partition {}", table.name))?;

            for part in parts {
                let rel = partition_path(&part, table.partition_by)?;
                let mut body = part.drop_many(table.partition_by.iter().copied());
                self.write_file(&dir.join(rel).join(PART_FILE), &mut body)?;
                partitions += 1;
            }
        } else {
            self.write_file(&dir.join(PART_FILE), df)?;
        }

        tracing::info!(
            table = table.name,
            rows,
            partitions,
            location = %dir.display(),
            "Table written"
        );

        Ok(TableWriteSummary {
            table: table.name,
            rows,
            partitions,
            location: dir,
        })
    }
}

/// `col=value/...` directory for a frame holding a single partition.
pub fn partition_path(part: &DataFrame, partition_by: &[&str]) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for name in partition_by {
        let value = part.column(name)?.get(0)?;
        let text = value.str_value();
        let rendered = if value.is_null() || text.is_empty() {
            NULL_PARTITION.to_owned()
        } else {
            escape_partition_value(&text)
        };
        path.push(format!("{name}={rendered}"));
    }
    Ok(path)
}

/// Percent-escape characters that cannot appear in a path segment.
pub fn escape_partition_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '/' | '\\' | ':' | '=' | '%' | '"' | '*' | '?' | '<' | '>' | '|' | '#' | '\''
        ) || c.is_control()
        {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Collects written tables in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<BTreeMap<String, DataFrame>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last frame written for `name`.
    pub fn table(&self, name: &str) -> Option<DataFrame> {
        self.tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(name).cloned())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl TableSink for MemorySink {
    fn write_table(&self, table: &TableSpec, df: &mut DataFrame) -> Result<TableWriteSummary> {
        let partitions = if table.is_partitioned() {
            df.partition_by_stable(table.partition_by.iter().copied(), true)?
                .len()
        } else {
            0
        };

        self.tables
            .lock()
            .map_err(|_| EtlError::Write(format!("{} sink lock poisoned", table.name)))?
            .insert(table.name.to_owned(), df.clone());

        Ok(TableWriteSummary {
            table: table.name,
            rows: df.height(),
            partitions,
            location: PathBuf::from(table.dir_name()),
        })
    }
}
