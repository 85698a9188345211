//! assetpress CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;
mod handlers;
mod telemetry;

use commands::{CacheCommands, Commands, ConfigCommands};
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "assetpress")]
#[command(author, version, about = "Cached, asynchronous JS/CSS compression", long_about = None)]
pub(crate) struct Cli {
    /// Configuration file (YAML). Defaults to ./assetpress.yaml if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.log_json {
        config.log.json = true;
    }
    telemetry::init_tracing(&config.log);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { bind } => handlers::serve(config, config_path, bind).await?,
        Commands::Encode {
            kind,
            group,
            files,
            append,
            tag,
        } => handlers::encode(&config, kind, &group, &files, append, tag)?,
        Commands::Decode {
            kind,
            group,
            token,
            signature,
        } => handlers::decode(&config, kind, &group, &token, &signature)?,
        Commands::Compress { kind, file } => handlers::compress(&config, kind, &file).await?,
        Commands::Cache { command } => match command {
            CacheCommands::Clear { keys, all } => handlers::clear_cache(&config, &keys, all).await?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
        },
        Commands::Job => handlers::run_job(&config).await?,
    }

    Ok(())
}
