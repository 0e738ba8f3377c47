//! Raw dataset ingestion.
//!
//! A [`RecordSource`] hands the pipelines two lazy frames: the song catalog
//! and the activity log. [`JsonDirSource`] reads them from a directory tree
//! laid out as
//!
//! ```text
//! <input>/song_data/A/B/C/TRAABJL12903CDCF1A.json
//! <input>/log_data/2018/11/2018-11-12-events.json
//! ```
//!
//! Entries exactly three levels below a dataset root are taken (the
//! `song_data/*/*/*` glob). A file at that depth is read directly. A directory
//! at that depth contributes the files directly inside it.

use crate::error::{EtlError, Result, ResultExt as _};
use crate::schema::{log_schema, song_schema};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Dataset directory names under the input base.
pub const SONG_DATA_DIR: &str = "song_data";
pub const LOG_DATA_DIR: &str = "log_data";

/// Depth of the `*/*/*` glob below a dataset root.
const GLOB_DEPTH: usize = 3;

/// Supplier of the two raw datasets.
pub trait RecordSource: Send + Sync {
    /// Song-catalog records, one row per catalog entry.
    fn song_records(&self) -> Result<LazyFrame>;

    /// Activity-log records, one row per event, in a stable order.
    fn log_records(&self) -> Result<LazyFrame>;
}

/// Newline-delimited JSON files under a local (or mounted) base path.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    input_base: PathBuf,
}

impl JsonDirSource {
    pub fn new(input_base: impl Into<PathBuf>) -> Self {
        Self {
            input_base: input_base.into(),
        }
    }

    pub fn input_base(&self) -> &Path {
        &self.input_base
    }

    fn read_dataset(&self, dataset: &str, schema: Schema) -> Result<LazyFrame> {
        let root = self.input_base.join(dataset);
        let files = dataset_files(&root)?;
        tracing::info!(
            dataset,
            files = files.len(),
            root = %root.display(),
            "Reading raw dataset"
        );

        let df = read_ndjson_files(&files, Arc::new(schema))?;
        tracing::info!(dataset, rows = df.height(), "Raw dataset loaded");
        Ok(df.lazy())
    }
}

impl RecordSource for JsonDirSource {
    fn song_records(&self) -> Result<LazyFrame> {
        self.read_dataset(SONG_DATA_DIR, song_schema())
    }

    fn log_records(&self) -> Result<LazyFrame> {
        self.read_dataset(LOG_DATA_DIR, log_schema())
    }
}

/// Frames already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    songs: DataFrame,
    logs: DataFrame,
}

impl MemorySource {
    pub fn new(songs: DataFrame, logs: DataFrame) -> Self {
        Self { songs, logs }
    }
}

impl RecordSource for MemorySource {
    fn song_records(&self) -> Result<LazyFrame> {
        Ok(self.songs.clone().lazy())
    }

    fn log_records(&self) -> Result<LazyFrame> {
        Ok(self.logs.clone().lazy())
    }
}

/// List the files matched by `<root>/*/*/*`, sorted by path.
///
/// Hidden and bookkeeping files (leading `.` or `_`) are skipped.
pub fn dataset_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(EtlError::Read(format!(
            "Dataset directory not found: {}",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .min_depth(GLOB_DEPTH)
        .max_depth(GLOB_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.read_context(|| format!("Failed to walk {}", root.display()))?;

        if entry.file_type().is_dir() {
            files.extend(leaf_files(entry.path())?);
        } else {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(EtlError::Read(format!(
            "No JSON files found under {}/*/*/*",
            root.display()
        )));
    }

    Ok(files)
}

/// Non-hidden files directly inside `dir`, sorted. Any entry that cannot be
/// listed or stat-ed fails the whole listing.
fn leaf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for child in
        std::fs::read_dir(dir).read_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = child
            .read_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if is_hidden(&path) {
            continue;
        }

        let meta = std::fs::metadata(&path)
            .read_context(|| format!("Failed to stat {}", path.display()))?;
        if meta.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') || n.starts_with('_'))
}

/// Read each file with the same schema and stack them in file order.
///
/// Empty files contribute no rows. Fields absent from a record are null.
pub fn read_ndjson_files(files: &[PathBuf], schema: SchemaRef) -> Result<DataFrame> {
    let mut combined = DataFrame::empty_with_schema(&schema);

    for path in files {
        let meta = std::fs::metadata(path)
            .read_context(|| format!("Failed to stat {}", path.display()))?;
        if meta.len() == 0 {
            tracing::debug!(path = %path.display(), "Skipping empty file");
            continue;
        }

        let file = std::fs::File::open(path)
            .read_context(|| format!("Failed to open {}", path.display()))?;
        let df = JsonLineReader::new(file)
            .with_schema(schema.clone())
            .finish()
            .read_context(|| format!("Failed to parse {}", path.display()))?;

        combined
            .vstack_mut(&df)
            .read_context(|| format!("Schema mismatch in {}", path.display()))?;
    }

    combined.as_single_chunk_par();
    Ok(combined)
}
