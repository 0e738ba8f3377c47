//! `users` and `time` dimensions, derived from the activity log.

use crate::calendar::{self, Zone};
use crate::schema::{TIME_COLUMNS, USERS_COLUMNS, columns};
use anyhow::{Context as _, Result};
use polars::prelude::*;

/// One row per `userId`. When a user's `level` changes between events the
/// first event seen decides which row survives.
pub fn users_table(log_records: LazyFrame) -> LazyFrame {
    log_records
        .select(columns(&USERS_COLUMNS))
        .unique_stable(Some(vec!["userId".into()]), UniqueKeepStrategy::First)
}

/// One row per distinct `start_time`.
///
/// Every distinct `ts` goes through a single [`calendar::decompose`] call.
/// Null timestamps and instants chrono cannot represent produce no row.
pub fn time_table(log_records: LazyFrame, zone: Zone) -> Result<DataFrame> {
    let distinct = log_records
        .select([col("ts").cast(DataType::Int64)])
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()
        .context("Failed to collect distinct log timestamps")?;

    let ts = distinct.column("ts")?.as_materialized_series().i64()?.clone();

    let capacity = ts.len();
    let mut start_time = Vec::with_capacity(capacity);
    let mut hour = Vec::with_capacity(capacity);
    let mut day = Vec::with_capacity(capacity);
    let mut week = Vec::with_capacity(capacity);
    let mut month = Vec::with_capacity(capacity);
    let mut year = Vec::with_capacity(capacity);
    let mut weekday = Vec::with_capacity(capacity);

    for parts in ts
        .into_iter()
        .flatten()
        .filter_map(|t| calendar::decompose(t, zone))
    {
        start_time.push(parts.start_time);
        hour.push(parts.hour);
        day.push(parts.day);
        week.push(parts.week);
        month.push(parts.month);
        year.push(parts.year);
        weekday.push(parts.weekday);
    }

    let skipped = capacity - start_time.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Timestamps without a civil time dropped");
    }

    let df = df!(
        "start_time" => start_time,
        "hour" => hour,
        "day" => day,
        "week" => week,
        "month" => month,
        "year" => year,
        "weekday" => weekday,
    )?;

    df.lazy()
        .drop_nulls(None)
        .unique_stable(Some(vec!["start_time".into()]), UniqueKeepStrategy::First)
        .select(columns(&TIME_COLUMNS))
        .collect()
        .context("Failed to build time table")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs() -> Result<DataFrame> {
        Ok(df!(
            "ts" => [Some(1_541_121_934_796i64), Some(1_541_106_106_796), Some(1_541_121_934_796), None],
            "userId" => ["10", "26", "10", ""],
            "firstName" => [Some("Sylvie"), Some("Ryan"), Some("Sylvie"), None],
            "lastName" => [Some("Cruz"), Some("Smith"), Some("Cruz"), None],
            "gender" => [Some("F"), Some("M"), Some("F"), None],
            "level" => ["free", "free", "paid", "free"],
            "page" => ["NextSong", "NextSong", "Home", "Home"],
        )?)
    }

    #[test]
    fn test_users_table_one_row_per_user() -> Result<()> {
        let users = users_table(logs()?.lazy()).collect()?;

        assert_eq!(users.width(), USERS_COLUMNS.len());
        assert_eq!(users.height(), 3);

        let ids = users.column("userId")?.as_materialized_series().str()?.clone();
        let levels = users.column("level")?.as_materialized_series().str()?.clone();
        assert_eq!(ids.get(0), Some("10"));
        // First-seen level for user 10 wins
        assert_eq!(levels.get(0), Some("free"));
        Ok(())
    }

    #[test]
    fn test_time_table_one_row_per_distinct_ts() -> Result<()> {
        let time = time_table(logs()?.lazy(), Zone::Utc)?;

        let names: Vec<_> = time.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, TIME_COLUMNS.to_vec());
        assert_eq!(time.height(), 2);
        assert!(time.get_columns().iter().all(|c| c.null_count() == 0));

        let start = time.column("start_time")?.as_materialized_series().str()?.clone();
        assert_eq!(start.get(0), Some("2018-11-02 01:25:34.796"));
        assert_eq!(start.get(1), Some("2018-11-01 21:01:46.796"));

        let hour = time.column("hour")?.as_materialized_series().i32()?.clone();
        let weekday = time.column("weekday")?.as_materialized_series().str()?.clone();
        let week = time.column("week")?.as_materialized_series().str()?.clone();
        assert_eq!(hour.get(1), Some(21));
        assert_eq!(weekday.get(1), Some("Thursday"));
        assert_eq!(week.get(1), Some("44"));
        Ok(())
    }

    #[test]
    fn test_time_table_components_agree_with_start_time() -> Result<()> {
        let time = time_table(logs()?.lazy(), Zone::Local)?;

        let start = time.column("start_time")?.as_materialized_series().str()?.clone();
        let year = time.column("year")?.as_materialized_series().i32()?.clone();
        let month = time.column("month")?.as_materialized_series().i32()?.clone();
        let day = time.column("day")?.as_materialized_series().i32()?.clone();
        let hour = time.column("hour")?.as_materialized_series().i32()?.clone();

        for i in 0..time.height() {
            let rebuilt = format!(
                "{:04}-{:02}-{:02} {:02}",
                year.get(i).unwrap(),
                month.get(i).unwrap(),
                day.get(i).unwrap(),
                hour.get(i).unwrap()
            );
            assert!(start.get(i).unwrap().starts_with(&rebuilt));
        }
        Ok(())
    }

    #[test]
    fn test_time_table_without_timestamps_is_empty() -> Result<()> {
        let empty = df!("ts" => [None::<i64>, None])?;
        let time = time_table(empty.lazy(), Zone::Utc)?;

        assert_eq!(time.height(), 0);
        assert_eq!(time.width(), TIME_COLUMNS.len());
        Ok(())
    }
}
