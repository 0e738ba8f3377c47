//! Star-schema pipelines.
//!
//! Two pipelines share the Polars engine:
//!
//! - **Song pipeline** ([`process_song_data`]): song catalog → `songs`
//!   (partitioned by `year`, `artist_id`) and `artists`.
//! - **Log pipeline** ([`process_log_data`]): activity log → `users`, `time`
//!   (partitioned by `year`, `month`) and the `songplays` fact table
//!   (partitioned by `year`, `month`).
//!
//! The table builders in [`songs`], [`logs`] and [`songplays`] are pure
//! functions over lazy frames and can be used without a source or sink:
//!
//! ```
//! use polars::prelude::*;
//! use sparkify_lake::pipeline::songs::songs_table;
//!
//! let catalog = df!(
//!     "song_id" => ["SOZCTXZ12AB0182364", "SOZCTXZ12AB0182364"],
//!     "title" => ["Setanta matins", "Setanta matins"],
//!     "artist_id" => ["AR5KOSW1187FB35FF4", "AR5KOSW1187FB35FF4"],
//!     "year" => [0i64, 0],
//!     "duration" => [269.58322f64, 269.58322],
//! )?;
//! let songs = songs_table(catalog.lazy()).collect()?;
//! assert_eq!(songs.height(), 1);
//! # Ok::<(), PolarsError>(())
//! ```
//!
//! # Example: full run
//!
//! ```no_run
//! use sparkify_lake::calendar::Zone;
//! use sparkify_lake::pipeline::{Pipelines, run};
//! use sparkify_lake::sink::{ParquetDirSink, ParquetOptions};
//! use sparkify_lake::source::JsonDirSource;
//!
//! let source = JsonDirSource::new("data/input");
//! let sink = ParquetDirSink::new("data/output", ParquetOptions::default());
//! let report = run(&source, &sink, Zone::Local, Pipelines::All)?;
//! println!("{}", report.summary());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod executor;
pub mod logs;
pub mod songplays;
pub mod songs;

pub use executor::{Pipelines, RunReport, process_log_data, process_song_data, run};
