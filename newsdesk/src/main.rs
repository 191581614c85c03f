//! newsdesk: admin command line for the TCoEFS news site
//!
//! Reads the same environment the site deploys with (`SUPABASE_URL`,
//! `SUPABASE_ANON_KEY`, ...), optionally from a `.env` file.

mod commands;

use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{Commands, Desk};
use newsroom::{AuthClient, ImageHost, NewsConfig, RestClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Admin command line for the TCoEFS news site")]
struct Cli {
    /// Access token of a signed-in user; needed for likes and admin actions
    #[arg(long, env = "NEWSDESK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("newsdesk={0},newsroom={0}", cli.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    let config = match NewsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database: {}", config.database.base_url);

    let mut rest = RestClient::new(config.database.clone())?;
    let auth = AuthClient::new(config.database.clone(), config.site.public_base_url.clone())?;
    let viewer = match &cli.access_token {
        Some(token) => {
            let viewer = auth.current_viewer(token).await?;
            info!(viewer = %viewer.id, admin = viewer.is_admin(), "Signed in");
            rest = rest.with_access_token(token.clone());
            Some(viewer)
        }
        None => None,
    };

    let images = if config.media.is_configured() {
        Some(ImageHost::new(config.media)?)
    } else {
        None
    };

    let mut desk = Desk::new(Arc::new(rest), viewer, config.site).with_auth(auth);
    if let Some(images) = images {
        desk = desk.with_images(images);
    }
    match desk.execute(cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
