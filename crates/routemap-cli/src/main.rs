//! routemap - URL route document tooling
//!
//! Exports a registered route tree as a portable JSON document, inspects
//! which names a filter lets through, runs translation consistency checks,
//! and validates documents by reconstructing them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use routemap_core::RoutemapConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// routemap - URL route document tooling
#[derive(Parser, Debug)]
#[command(name = "routemap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "routemap.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a urlconf as a JSON route document
    Export(commands::export::ExportArgs),

    /// List the names an export would contain, after filtering
    Names(commands::names::NamesArgs),

    /// Check translated patterns for kwarg mismatches and positional args
    Check(commands::check::CheckArgs),

    /// Validate a route document by reconstructing it
    Import(commands::import::ImportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = if cli.config.exists() {
        RoutemapConfig::from_file(&cli.config)
            .with_context(|| format!("failed to load {}", cli.config.display()))?
    } else {
        RoutemapConfig::default()
    };

    match cli.command {
        Commands::Export(args) => commands::export::run(&config, &args),
        Commands::Names(args) => commands::names::run(&config, &args),
        Commands::Check(args) => commands::check::run(&config, &args),
        Commands::Import(args) => commands::import::run(&config, &args),
    }
}
