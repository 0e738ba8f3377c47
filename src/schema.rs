//! Read schemas for the raw datasets and the layout of the five output tables.

use polars::prelude::*;

/// Output table name plus the columns its files are partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub partition_by: &'static [&'static str],
}

impl TableSpec {
    /// Directory name under the output base, e.g. `songs.parquet`.
    pub fn dir_name(&self) -> String {
        format!("{}.parquet", self.name)
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_by.is_empty()
    }
}

pub const SONGS: TableSpec = TableSpec {
    name: "songs",
    partition_by: &["year", "artist_id"],
};

pub const ARTISTS: TableSpec = TableSpec {
    name: "artists",
    partition_by: &[],
};

pub const USERS: TableSpec = TableSpec {
    name: "users",
    partition_by: &[],
};

pub const TIME: TableSpec = TableSpec {
    name: "time",
    partition_by: &["year", "month"],
};

pub const SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    partition_by: &["year", "month"],
};

pub const SONGS_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];

pub const ARTISTS_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

pub const USERS_COLUMNS: [&str; 5] = ["userId", "firstName", "lastName", "gender", "level"];

pub const TIME_COLUMNS: [&str; 7] = [
    "start_time",
    "hour",
    "day",
    "week",
    "month",
    "year",
    "weekday",
];

pub const SONGPLAYS_COLUMNS: [&str; 11] = [
    "songplay_id",
    "start_time",
    "userId",
    "level",
    "song_id",
    "artist_id",
    "sessionId",
    "location",
    "userAgent",
    "year",
    "month",
];

/// Read schema for one song-catalog record.
pub fn song_schema() -> Schema {
    Schema::from_iter([
        Field::new("num_songs".into(), DataType::Int64),
        Field::new("artist_id".into(), DataType::String),
        Field::new("artist_latitude".into(), DataType::Float64),
        Field::new("artist_longitude".into(), DataType::Float64),
        Field::new("artist_location".into(), DataType::String),
        Field::new("artist_name".into(), DataType::String),
        Field::new("song_id".into(), DataType::String),
        Field::new("title".into(), DataType::String),
        Field::new("duration".into(), DataType::Float64),
        Field::new("year".into(), DataType::Int64),
    ])
}

/// Read schema for one activity-log event.
pub fn log_schema() -> Schema {
    Schema::from_iter([
        Field::new("artist".into(), DataType::String),
        Field::new("auth".into(), DataType::String),
        Field::new("firstName".into(), DataType::String),
        Field::new("gender".into(), DataType::String),
        Field::new("itemInSession".into(), DataType::Int64),
        Field::new("lastName".into(), DataType::String),
        Field::new("length".into(), DataType::Float64),
        Field::new("level".into(), DataType::String),
        Field::new("location".into(), DataType::String),
        Field::new("method".into(), DataType::String),
        Field::new("page".into(), DataType::String),
        Field::new("registration".into(), DataType::Float64),
        Field::new("sessionId".into(), DataType::Int64),
        Field::new("song".into(), DataType::String),
        Field::new("status".into(), DataType::Int64),
        Field::new("ts".into(), DataType::Int64),
        Field::new("userAgent".into(), DataType::String),
        Field::new("userId".into(), DataType::String),
    ])
}

/// `col(..)` expressions for a fixed column list.
pub fn columns(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|name| col(*name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_schemas_cover_projected_columns() {
        let songs = song_schema();
        for name in SONGS_COLUMNS.iter().chain(ARTISTS_COLUMNS.iter()) {
            assert!(songs.contains(name), "song schema is missing {name}");
        }

        let logs = log_schema();
        for name in USERS_COLUMNS
            .iter()
            .chain(["ts", "page", "song", "artist", "sessionId", "location", "userAgent"].iter())
        {
            assert!(logs.contains(name), "log schema is missing {name}");
        }
    }

    #[test]
    fn test_partition_columns_are_output_columns() {
        for name in SONGS.partition_by {
            assert!(SONGS_COLUMNS.contains(name));
        }
        for name in TIME.partition_by {
            assert!(TIME_COLUMNS.contains(name));
        }
        for name in SONGPLAYS.partition_by {
            assert!(SONGPLAYS_COLUMNS.contains(name));
        }
        assert!(!ARTISTS.is_partitioned());
        assert_eq!(SONGPLAYS.dir_name(), "songplays.parquet");
    }
}
