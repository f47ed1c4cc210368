//! croon - song generation over MCP
//!
//! Subcommands:
//! - `croon mcp` - MCP over stdin/stdout
//! - `croon serve` - MCP over streamable HTTP, plus `/health`
//! - `croon config` - print the resolved configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use croon::{serve, stdio, telemetry, SongAdapter, SongHandler};
use croonconf::{ConfigSources, CroonConfig};

#[derive(Parser)]
#[command(name = "croon")]
#[command(about = "MCP server for song generation")]
#[command(version)]
struct Cli {
    /// Config file, loaded after system and user configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Mcp,

    /// Serve MCP over HTTP
    Serve {
        /// Address to bind (default from config: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port to bind (default from config: 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the resolved configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Existing environment variables win over .env
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to load .env"),
    }

    let cli = Cli::parse();

    let (mut config, sources) = CroonConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            print_config(&config, &sources);
        }
        Commands::Mcp => {
            let _telemetry = telemetry::init(&config.telemetry)?;
            stdio::run(build_handler(&config)?).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.bind.host = host;
            }
            if let Some(port) = port {
                config.bind.http_port = port;
            }
            let _telemetry = telemetry::init(&config.telemetry)?;
            serve::run(build_handler(&config)?, &config.bind.addr()).await?;
        }
    }

    Ok(())
}

fn build_handler(config: &CroonConfig) -> Result<SongHandler> {
    let adapter = SongAdapter::new(config).context("croon cannot start")?;
    info!(
        upstream = %adapter.upstream_url(),
        model = %adapter.model(),
        interval_ms = config.polling.interval_ms,
        timeout_secs = config.polling.timeout_secs,
        "song adapter ready"
    );
    if config.session.captcha_api_key.is_some() {
        info!("captcha key configured; captcha challenges are still reported as upstream errors");
    }
    Ok(SongHandler::new(adapter))
}

fn print_config(config: &CroonConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());
    println!();
    println!("# sources");
    if sources.files.is_empty() && sources.env_overrides.is_empty() {
        println!("#   (defaults only)");
    }
    for file in &sources.files {
        println!("#   file: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("#   env:  {}", var);
    }
}
