//! # sparkify-lake entry point
//!
//! ```bash
//! sparkify-lake --input data/raw --output data/lake           # both pipelines
//! sparkify-lake --config sparkify.json songs                  # songs + artists
//! sparkify-lake --config sparkify.json --timezone utc logs    # users, time, songplays
//! sparkify-lake init-config sparkify.json                     # config template
//! ```
//!
//! Any failure is reported on stderr and the process exits non-zero.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, reason = "the CLI reports results on stdout")]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run_command(cli)
}
