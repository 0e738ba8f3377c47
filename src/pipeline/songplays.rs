//! `songplays` fact table.
//!
//! Built in explicitly ordered stages:
//!
//! 1. [`assign_songplay_ids`] numbers every log row.
//! 2. [`next_song_events`] keeps `page == "NextSong"`. Ids of the dropped
//!    rows are never reused, so the surviving ids have gaps.
//! 3. [`with_start_time`] recomputes `start_time` from `ts`.
//! 4. [`songplays_table`] inner-joins to the catalog on exact
//!    `(title, artist_name)` and to `time` on `start_time`.
//!
//! Stages 1 and 2 must stay separate and in that order; fusing them would
//! renumber the rows and close the gaps.

use crate::calendar::{self, Zone};
use crate::schema::{SONGPLAYS_COLUMNS, columns};
use anyhow::{Context as _, Result};
use polars::prelude::*;

pub const SONGPLAY_ID: &str = "songplay_id";

/// `page` value of a song play event.
pub const NEXT_SONG: &str = "NextSong";

/// Log columns carried into the catalog join.
const EVENT_COLUMNS: [&str; 9] = [
    SONGPLAY_ID,
    "ts",
    "userId",
    "level",
    "song",
    "artist",
    "sessionId",
    "location",
    "userAgent",
];

/// Number every log row, starting at 0, in input order.
pub fn assign_songplay_ids(log_records: LazyFrame) -> LazyFrame {
    log_records
        .with_row_index(SONGPLAY_ID, None)
        .with_column(col(SONGPLAY_ID).cast(DataType::Int64))
}

/// Keep only song play events.
pub fn next_song_events(log_records: LazyFrame) -> LazyFrame {
    log_records.filter(col("page").eq(lit(NEXT_SONG)))
}

/// Add a `start_time` column rendered exactly like the `time` table's key.
pub fn with_start_time(mut events: DataFrame, zone: Zone) -> Result<DataFrame> {
    let ts = events
        .column("ts")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;

    let start_time: StringChunked = ts
        .i64()?
        .into_iter()
        .map(|t| t.and_then(|t| calendar::start_time(t, zone)))
        .collect();

    events.with_column(start_time.with_name("start_time".into()).into_series())?;
    Ok(events)
}

/// Join NextSong events to the catalog and the `time` table.
///
/// Events whose `(song, artist)` pair has no exact catalog match, or whose
/// `start_time` is missing from `time`, are dropped. That loss is expected and
/// only reported at debug level. A pair listed more than once in the catalog
/// matches its first entry.
pub fn songplays_table(
    log_records: LazyFrame,
    song_records: LazyFrame,
    time: LazyFrame,
    zone: Zone,
) -> Result<DataFrame> {
    let events = next_song_events(assign_songplay_ids(log_records))
        .select(columns(&EVENT_COLUMNS))
        .collect()
        .context("Failed to collect NextSong events")?;
    let events = with_start_time(events, zone)?;
    let candidates = events.height();

    let catalog = song_records
        .select(columns(&["title", "artist_name", "song_id", "artist_id"]))
        .unique_stable(
            Some(vec!["title".into(), "artist_name".into()]),
            UniqueKeepStrategy::First,
        );

    let time = time.select(columns(&["start_time", "year", "month"]));

    let songplays = events
        .lazy()
        .join(
            catalog,
            [col("song"), col("artist")],
            [col("title"), col("artist_name")],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            time,
            [col("start_time")],
            [col("start_time")],
            JoinArgs::new(JoinType::Inner),
        )
        .unique_stable(Some(vec![SONGPLAY_ID.into()]), UniqueKeepStrategy::First)
        .sort([SONGPLAY_ID], SortMultipleOptions::default())
        .select(columns(&SONGPLAYS_COLUMNS))
        .collect()
        .context("Failed to join songplays")?;

    tracing::debug!(
        candidates,
        matched = songplays.height(),
        dropped = candidates.saturating_sub(songplays.height()),
        "NextSong events without catalog or time match dropped"
    );

    Ok(songplays)
}
