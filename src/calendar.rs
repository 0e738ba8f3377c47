//! Epoch-millisecond to civil-time decomposition.
//!
//! Both the `time` dimension and the `songplays` join key are derived from
//! [`decompose`]/[`start_time`], so the two always agree on the exact string
//! used for `start_time`.

use chrono::{DateTime, Datelike as _, Local, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};

/// Canonical rendering of `start_time`, e.g. `2018-11-02 01:25:34.796`.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Zone used to turn an epoch instant into civil time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// The zone of the machine running the job
    #[default]
    Local,
    Utc,
}

impl Zone {
    /// Civil datetime for `ts_millis`, or `None` when the instant is out of
    /// chrono's range.
    pub fn civil(self, ts_millis: i64) -> Option<NaiveDateTime> {
        let instant = DateTime::from_timestamp_millis(ts_millis)?;
        Some(match self {
            Self::Local => instant.with_timezone(&Local).naive_local(),
            Self::Utc => instant.naive_utc(),
        })
    }
}

impl std::str::FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(format!("unknown timezone '{other}', expected 'local' or 'utc'")),
        }
    }
}

/// One row of the `time` dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: String,
    pub hour: i32,
    pub day: i32,
    /// `%W`: Monday-based week of year, `00` before the first Monday
    pub week: String,
    pub month: i32,
    pub year: i32,
    /// `%A`: full weekday name
    pub weekday: String,
}

/// Decompose an epoch-millisecond timestamp into its calendar fields.
pub fn decompose(ts_millis: i64, zone: Zone) -> Option<TimeParts> {
    let dt = zone.civil(ts_millis)?;
    Some(TimeParts {
        start_time: dt.format(START_TIME_FORMAT).to_string(),
        hour: dt.hour() as i32,
        day: dt.day() as i32,
        week: dt.format("%W").to_string(),
        month: dt.month() as i32,
        year: dt.year(),
        weekday: dt.format("%A").to_string(),
    })
}

/// Just the `start_time` string for `ts_millis`.
pub fn start_time(ts_millis: i64, zone: Zone) -> Option<String> {
    zone.civil(ts_millis)
        .map(|dt| dt.format(START_TIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_utc() {
        let parts = decompose(1_541_121_934_796, Zone::Utc).unwrap();

        assert_eq!(parts.start_time, "2018-11-02 01:25:34.796");
        assert_eq!(parts.hour, 1);
        assert_eq!(parts.day, 2);
        assert_eq!(parts.week, "44");
        assert_eq!(parts.month, 11);
        assert_eq!(parts.year, 2018);
        assert_eq!(parts.weekday, "Friday");
    }

    #[test]
    fn test_week_zero_before_first_monday() {
        // 2017-01-01 was a Sunday
        let sunday = decompose(1_483_272_000_000, Zone::Utc).unwrap();
        assert_eq!(sunday.week, "00");
        assert_eq!(sunday.weekday, "Sunday");

        let monday = decompose(1_483_358_400_000, Zone::Utc).unwrap();
        assert_eq!(monday.week, "01");
        assert_eq!(monday.weekday, "Monday");
    }

    #[test]
    fn test_start_time_matches_decompose() {
        for ts in [0, 1_541_106_106_796, 1_546_300_799_999] {
            for zone in [Zone::Utc, Zone::Local] {
                assert_eq!(
                    start_time(ts, zone),
                    decompose(ts, zone).map(|p| p.start_time)
                );
            }
        }
    }

    #[test]
    fn test_start_time_reparses_to_components() {
        let parts = decompose(1_546_300_799_999, Zone::Local).unwrap();
        let parsed =
            NaiveDateTime::parse_from_str(&parts.start_time, START_TIME_FORMAT).unwrap();

        assert_eq!(parsed.year(), parts.year);
        assert_eq!(parsed.month() as i32, parts.month);
        assert_eq!(parsed.day() as i32, parts.day);
        assert_eq!(parsed.hour() as i32, parts.hour);
        assert_eq!(parsed, Zone::Local.civil(1_546_300_799_999).unwrap());
    }

    #[test]
    fn test_millisecond_precision_is_kept() {
        let a = start_time(1_541_121_934_000, Zone::Utc).unwrap();
        let b = start_time(1_541_121_934_001, Zone::Utc).unwrap();
        assert_eq!(a, "2018-11-02 01:25:34.000");
        assert_ne!(a, b);
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(decompose(i64::MAX, Zone::Utc).is_none());
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("UTC".parse::<Zone>(), Ok(Zone::Utc));
        assert_eq!("local".parse::<Zone>(), Ok(Zone::Local));
        assert!("mars".parse::<Zone>().is_err());
    }
}
