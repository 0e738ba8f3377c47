//! # sparkify-lake
//!
//! Batch ETL that turns two raw JSON datasets, a song catalog and a
//! listening-activity log, into a star schema of Parquet tables:
//!
//! | Table | Kind | Partitioned by |
//! |---|---|---|
//! | `songs` | dimension | `year`, `artist_id` |
//! | `artists` | dimension | |
//! | `users` | dimension | |
//! | `time` | dimension | `year`, `month` |
//! | `songplays` | fact | `year`, `month` |
//!
//! Every run recomputes all tables from the raw input and overwrites the
//! previous output.
//!
//! ## Core Modules
//!
//! - [`pipeline`]: table builders and the run executor
//! - [`calendar`]: epoch-millisecond to civil-time decomposition
//! - [`source`]: raw dataset ingestion ([`source::RecordSource`])
//! - [`sink`]: partitioned Parquet output ([`sink::TableSink`])
//! - [`schema`]: read schemas and output table layouts
//! - [`config`]: run configuration
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: error types

#![warn(clippy::all, rust_2018_idioms)]

pub mod calendar;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;
