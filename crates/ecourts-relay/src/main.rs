//! # eCourts Relay
//!
//! Stateless relay between a browser frontend and the eCourts portals.
//! Forwards captcha image fetches and case status queries while carrying
//! the session cookie jar back and forth in each request/response body.
//!
//! ## Flow
//! ```text
//! Frontend → Relay → eCourts portal (direct or via ScraperAPI)
//!     ↑                    ↓
//!     └── cookies travel in every body, never stored here
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod error;
mod routes;
mod state;
mod upstream;

use config::RelayConfig;
use state::AppState;

/// eCourts captcha/case-status relay
#[derive(Parser, Debug)]
#[command(name = "ecourts-relay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/relay.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// ScraperAPI key; enables relay mode for upstream calls (overrides config)
    #[arg(long, env = "SCRAPERAPI_KEY")]
    scraperapi_key: Option<String>,

    /// Allowed CORS origin (overrides config)
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!(
        "🚀 Starting eCourts relay v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = RelayConfig::load(&args.config, &args)?;
    info!("📋 Configuration loaded from {}", args.config);

    if config.scraperapi_key.is_none() {
        warn!("No ScraperAPI key configured; upstream calls go direct to the portals");
    }

    let state = AppState::new(config.clone())?;
    info!(mode = %state.upstream.mode_name(), "Upstream fetcher ready");

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("✅ Relay listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Relay shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("🛑 Shutdown signal received");
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}
