//! Fiesta - send one prompt to many LLMs and compare the answers

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fiesta::catalog::Catalog;
use fiesta::llm::{Dispatcher, LlmProvider, OpenRouterProvider};
use fiesta::server::{self, AppState};
use fiesta::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides the config file)
    #[arg(short, long)]
    addr: Option<SocketAddr>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env is normal
    let _ = dotenvy::dotenv();

    // Initialize logging
    let filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load(args.config.as_deref()).context("loading configuration")?;

    let addr = match args.addr {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", config.server.bind))?,
    };

    let provider = OpenRouterProvider::new(&config.upstream)?;
    if provider.ensure_ready().is_err() {
        warn!(
            key = %config.upstream.api_key_name(),
            "Upstream API key missing; /api/chat will answer 503 until it is set"
        );
    }

    let dispatcher = Dispatcher::new(Arc::new(provider), &config.dispatch);
    let catalog = Catalog::new(config.catalog.clone());
    info!(
        endpoint = %config.upstream.endpoint,
        models = catalog.models().len(),
        "Configuration loaded"
    );

    server::serve(AppState::new(dispatcher, catalog), addr, &config.server.cors_origins).await?;
    Ok(())
}
