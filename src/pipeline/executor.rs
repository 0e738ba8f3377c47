//! Pipeline execution.
//!
//! Reads the raw datasets from a [`RecordSource`], builds each table and hands
//! it to a [`TableSink`]. The first failure aborts the run.

use super::logs::{time_table, users_table};
use super::songplays::songplays_table;
use super::songs::{artists_table, songs_table};
use crate::calendar::Zone;
use crate::schema::{ARTISTS, SONGPLAYS, SONGS, TIME, TableSpec, USERS};
use crate::sink::{TableSink, TableWriteSummary};
use crate::source::RecordSource;
use anyhow::{Context as _, Result};
use polars::prelude::*;
use std::time::{Duration, Instant};

/// Which pipelines a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pipelines {
    #[default]
    All,
    Songs,
    Logs,
}

/// Report generated after a run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per table written, in write order
    pub tables: Vec<TableWriteSummary>,

    /// Time taken for the whole run
    pub duration: Duration,
}

impl RunReport {
    pub fn table(&self, name: &str) -> Option<&TableWriteSummary> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        let tables = self
            .tables
            .iter()
            .map(|t| format!("{}={}", t.table, t.rows))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Run completed: {} tables ({tables}), {} rows, {:.2}s",
            self.tables.len(),
            self.total_rows(),
            self.duration.as_secs_f64()
        )
    }
}

/// Run the selected pipelines, songs first.
pub fn run(
    source: &dyn RecordSource,
    sink: &dyn TableSink,
    zone: Zone,
    pipelines: Pipelines,
) -> Result<RunReport> {
    let start = Instant::now();
    let mut tables = Vec::new();

    if matches!(pipelines, Pipelines::All | Pipelines::Songs) {
        tables.extend(process_song_data(source, sink)?);
    }
    if matches!(pipelines, Pipelines::All | Pipelines::Logs) {
        tables.extend(process_log_data(source, sink, zone)?);
    }

    Ok(RunReport {
        tables,
        duration: start.elapsed(),
    })
}

/// Build and write `songs` and `artists`.
pub fn process_song_data(
    source: &dyn RecordSource,
    sink: &dyn TableSink,
) -> Result<Vec<TableWriteSummary>> {
    let _span = tracing::info_span!("song_pipeline").entered();

    let song_records = source
        .song_records()
        .context("Failed to read song data")?;

    let songs = collect_table(&SONGS, songs_table(song_records.clone()))?;
    let artists = collect_table(&ARTISTS, artists_table(song_records))?;

    Ok(vec![
        write_table(sink, &SONGS, songs)?,
        write_table(sink, &ARTISTS, artists)?,
    ])
}

/// Build and write `users`, `time` and `songplays`.
///
/// `songplays` joins against the `time` frame built in this same call and
/// against the raw song catalog, never against previously written output.
pub fn process_log_data(
    source: &dyn RecordSource,
    sink: &dyn TableSink,
    zone: Zone,
) -> Result<Vec<TableWriteSummary>> {
    let _span = tracing::info_span!("log_pipeline").entered();

    let log_records = source.log_records().context("Failed to read log data")?;

    let users = collect_table(&USERS, users_table(log_records.clone()))?;
    let users = write_table(sink, &USERS, users)?;

    let time = time_table(log_records.clone(), zone).context("Failed to build time table")?;
    tracing::info!(table = TIME.name, rows = time.height(), "Table built");
    let time_frame = time.clone().lazy();
    let time = write_table(sink, &TIME, time)?;

    let song_records = source
        .song_records()
        .context("Failed to read song data for songplays")?;
    let songplays = songplays_table(log_records, song_records, time_frame, zone)
        .context("Failed to build songplays table")?;
    tracing::info!(table = SONGPLAYS.name, rows = songplays.height(), "Table built");
    let songplays = write_table(sink, &SONGPLAYS, songplays)?;

    Ok(vec![users, time, songplays])
}

fn collect_table(table: &TableSpec, lf: LazyFrame) -> Result<DataFrame> {
    let df = lf
        .collect()
        .with_context(|| format!("Failed to build {} table", table.name))?;
    tracing::info!(table = table.name, rows = df.height(), "Table built");
    Ok(df)
}

fn write_table(
    sink: &dyn TableSink,
    table: &TableSpec,
    mut df: DataFrame,
) -> Result<TableWriteSummary> {
    sink.write_table(table, &mut df)
        .with_context(|| format!("Failed to write {}", table.dir_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EtlError, Result as EtlResult};
    use crate::sink::MemorySink;
    use crate::source::MemorySource;

    fn source() -> Result<MemorySource> {
        let songs = df!(
            "song_id" => ["SOZCTXZ12AB0182364", "SOUPIRU12A6D4FA1E1"],
            "title" => ["Setanta matins", "Der Kleine Dompfaff"],
            "artist_id" => ["AR5KOSW1187FB35FF4", "ARJIE2Y1187B994AB7"],
            "year" => [0i64, 0],
            "duration" => [269.58322f64, 152.92036],
            "artist_name" => ["Elena", "Line Renaud"],
            "artist_location" => [Some("Dubai UAE"), None],
            "artist_latitude" => [Some(49.80388f64), None],
            "artist_longitude" => [Some(15.47491f64), None],
        )?;
        let logs = df!(
            "ts" => [1_541_121_934_796i64, 1_541_106_106_796],
            "userId" => ["10", "8"],
            "firstName" => ["Sylvie", "Kaylee"],
            "lastName" => ["Cruz", "Summers"],
            "gender" => ["F", "F"],
            "level" => ["free", "free"],
            "song" => [Some("Setanta matins"), None],
            "artist" => [Some("Elena"), None],
            "sessionId" => [484i64, 139],
            "location" => ["X", "Phoenix-Mesa-Scottsdale, AZ"],
            "userAgent" => ["Y", "Mozilla/5.0"],
            "page" => ["NextSong", "Home"],
        )?;
        Ok(MemorySource::new(songs, logs))
    }

    #[test]
    fn test_run_writes_all_five_tables() -> Result<()> {
        let sink = MemorySink::new();
        let report = run(&source()?, &sink, Zone::Utc, Pipelines::All)?;

        let written: Vec<_> = report.tables.iter().map(|t| t.table).collect();
        assert_eq!(written, vec!["songs", "artists", "users", "time", "songplays"]);
        assert_eq!(report.table("songplays").map(|t| t.rows), Some(1));
        assert_eq!(report.table("time").map(|t| t.rows), Some(2));
        assert_eq!(report.total_rows(), 2 + 2 + 2 + 2 + 1);
        assert!(report.summary().starts_with("Run completed: 5 tables"));
        assert_eq!(sink.table_names().len(), 5);
        Ok(())
    }

    #[test]
    fn test_song_pipeline_only() -> Result<()> {
        let sink = MemorySink::new();
        let report = run(&source()?, &sink, Zone::Utc, Pipelines::Songs)?;

        assert_eq!(report.tables.len(), 2);
        assert!(sink.table("users").is_none());
        Ok(())
    }

    #[test]
    fn test_run_is_deterministic() -> Result<()> {
        let first = MemorySink::new();
        let second = MemorySink::new();
        run(&source()?, &first, Zone::Utc, Pipelines::All)?;
        run(&source()?, &second, Zone::Utc, Pipelines::All)?;

        for name in first.table_names() {
            let a = first.table(&name).unwrap();
            let b = second.table(&name).unwrap();
            assert!(a.equals_missing(&b), "{name} differs between runs");
        }
        Ok(())
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn song_records(&self) -> EtlResult<LazyFrame> {
            Err(EtlError::Read("song_data unreachable".to_owned()))
        }

        fn log_records(&self) -> EtlResult<LazyFrame> {
            Err(EtlError::Read("log_data unreachable".to_owned()))
        }
    }

    #[test]
    fn test_read_failure_aborts_run() {
        let sink = MemorySink::new();
        let err = run(&FailingSource, &sink, Zone::Utc, Pipelines::All).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Read(_))
        ));
        assert!(sink.table_names().is_empty());
    }
}
