use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sparkify_lake::calendar::Zone;
use sparkify_lake::config::EtlConfig;
use sparkify_lake::pipeline::{self, Pipelines};
use sparkify_lake::sink::ParquetDirSink;
use sparkify_lake::source::JsonDirSource;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sparkify-lake",
    version,
    about = "Build the songplays star schema from raw song and log JSON"
)]
pub struct Cli {
    /// JSON configuration file. Defaults to ./sparkify.json when present.
    #[arg(long, global = true, env = "SPARKIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input base path containing song_data/ and log_data/
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Output base path for the <table>.parquet directories
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Zone used to derive start_time and calendar fields (local or utc)
    #[arg(long, global = true)]
    pub timezone: Option<Zone>,

    /// Directory for rotating log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run both pipelines (default)
    Run,
    /// Build songs and artists only
    Songs,
    /// Build users, time and songplays only
    Logs,
    /// Write a configuration template
    InitConfig {
        /// Where to write the template
        path: PathBuf,
    },
}

impl Cli {
    /// Configuration file values with command-line overrides applied.
    pub fn effective_config(&self) -> Result<EtlConfig> {
        let mut config = EtlConfig::load_or_default(self.config.as_deref())?;

        if let Some(input) = &self.input {
            config.input_data = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.output_data = Some(output.clone());
        }
        if let Some(zone) = self.timezone {
            config.timezone = zone;
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }

        Ok(config)
    }
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = cli.effective_config()?;

    let pipelines = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => Pipelines::All,
        Commands::Songs => Pipelines::Songs,
        Commands::Logs => Pipelines::Logs,
        Commands::InitConfig { path } => return handle_init_config(config, path),
    };

    sparkify_lake::logging::init(config.log_dir.as_deref())?;
    handle_run(&config, pipelines)
}

fn handle_run(config: &EtlConfig, pipelines: Pipelines) -> Result<()> {
    let paths = config.resolve_paths()?;

    tracing::info!(
        input = %paths.input_data.display(),
        output = %paths.output_data.display(),
        timezone = ?config.timezone,
        ?pipelines,
        "Starting run"
    );

    let source = JsonDirSource::new(&paths.input_data);
    let sink = ParquetDirSink::new(&paths.output_data, config.parquet.clone());
    let report = pipeline::run(&source, &sink, config.timezone, pipelines)?;

    tracing::info!("{}", report.summary());
    for table in &report.tables {
        println!(
            "{:<10} {:>8} rows {:>5} partitions  {}",
            table.table,
            table.rows,
            table.partitions,
            table.location.display()
        );
    }
    println!("{}", report.summary());
    Ok(())
}

fn handle_init_config(config: EtlConfig, path: PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
    }
    config
        .save(&path)
        .with_context(|| format!("Failed to write config template to {}", path.display()))?;
    println!("Configuration template written to {}", path.display());
    Ok(())
}
