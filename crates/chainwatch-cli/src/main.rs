mod commands;
mod config;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::commands::sample::SampleOptions;
use crate::config::ChainwatchConfig;

#[derive(Parser)]
#[command(name = "chainwatch", about = "Inspect encoded trigger run results")]
pub struct Cli {
    /// Path to a config file (defaults to ./chainwatch.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a trigger run result stream and print it as JSON
    Inspect {
        /// Encoded result file
        file: PathBuf,
        /// Which trigger result variant the file holds
        #[arg(long, value_enum, default_value_t = ResultKind::Chained)]
        kind: ResultKind,
    },
    /// Write a sample chained trigger run result stream
    Sample {
        /// Output file
        file: PathBuf,
        /// Make one of the sample actions fail
        #[arg(long)]
        fail_action: bool,
        /// Attach a script compile error to the trigger
        #[arg(long)]
        script_error: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResultKind {
    Chained,
    Query,
}

fn init_tracing(config: &ChainwatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ChainwatchConfig::resolve(cli.config.as_deref(), Path::new("."))?;
    if cli.pretty {
        config.output.pretty = true;
    }
    init_tracing(&config);

    match cli.command {
        Commands::Inspect { file, kind } => commands::inspect::handle(&file, kind, &config),
        Commands::Sample {
            file,
            fail_action,
            script_error,
        } => commands::sample::handle(
            &file,
            &SampleOptions {
                fail_action,
                script_error,
            },
            &config,
        ),
    }
}
