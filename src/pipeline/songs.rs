//! `songs` and `artists` dimensions, derived from the song catalog.

use crate::schema::{ARTISTS_COLUMNS, SONGS_COLUMNS, columns};
use polars::prelude::*;

/// One row per `song_id`, first catalog entry wins.
pub fn songs_table(song_records: LazyFrame) -> LazyFrame {
    song_records
        .select(columns(&SONGS_COLUMNS))
        .unique_stable(Some(vec!["song_id".into()]), UniqueKeepStrategy::First)
}

/// One row per `artist_id`, first catalog entry wins.
pub fn artists_table(song_records: LazyFrame) -> LazyFrame {
    song_records
        .select(columns(&ARTISTS_COLUMNS))
        .unique_stable(Some(vec!["artist_id".into()]), UniqueKeepStrategy::First)
}
