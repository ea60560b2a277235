//! ProofMeet Server
//!
//! Long-lived service for court-compliance attendance verification:
//! - Participant API for join/leave/heartbeat tracking
//! - Webhook intake from the video provider
//! - Public Court Card verification
//! - Background finalization sweeper (immediately on startup, then every 5
//!   minutes)
//!
//! # Usage
//!
//! ```bash
//! # Local development with seeded fixtures
//! proofmeet-server --dev-mode --fixtures ./fixtures/demo.json
//!
//! # Environment-driven production start
//! PROOFMEET_WEBHOOK_SECRET=... PROOFMEET_SIGNING_KEY_FILE=/etc/proofmeet/key \
//!     proofmeet-server --port 8443
//! ```

mod config;
mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proofmeet_api::{create_router, ApiConfig, AppState};
use proofmeet_auth::{PasswordService, SessionService, WebhookVerifier};
use proofmeet_crypto::SigningKeypair;
use proofmeet_engine::{
    AttendanceEngine, EngineConfig, FinalizationSweeper, LogSink,
};
use proofmeet_store::{HostCodeStore, MeetingDirectory, MemoryStore, ParticipantDirectory};

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// ProofMeet attendance verification server
#[derive(Parser, Debug)]
#[command(name = "proofmeet-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "PROOFMEET_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PROOFMEET_PORT")]
    port: Option<u16>,

    /// Shared secret for webhook verification
    #[arg(long, env = "PROOFMEET_WEBHOOK_SECRET")]
    webhook_secret: Option<String>,

    /// Base URL of the public verification frontend
    #[arg(long, env = "PROOFMEET_FRONTEND_BASE")]
    frontend_base: Option<String>,

    /// Hex-encoded Ed25519 seed file for the process signing key
    #[arg(long, env = "PROOFMEET_SIGNING_KEY_FILE")]
    signing_key_file: Option<String>,

    /// JSON fixtures with meetings and participants to seed
    #[arg(long, env = "PROOFMEET_FIXTURES")]
    fixtures: Option<String>,

    /// Finalization sweep interval in seconds
    #[arg(long, env = "PROOFMEET_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PROOFMEET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "PROOFMEET_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Enable development mode (relaxed secret checks)
    #[arg(long, env = "PROOFMEET_DEV_MODE")]
    dev_mode: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secret) = self.webhook_secret {
            config.webhook_secret = secret;
        }
        if let Some(base) = self.frontend_base {
            config.frontend_base = base;
        }
        config.signing_key_file = self.signing_key_file;
        config.fixtures_file = self.fixtures;
        if let Some(interval) = self.sweep_interval_secs {
            config.sweep_interval_secs = interval;
        }
        config.log_level = self.log_level;
        config.log_format = self.log_format;
        config
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dev_mode = args.dev_mode;
    let config = args.into_config();

    init_logging(&config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting ProofMeet server"
    );

    config.validate(dev_mode)?;

    // Process-wide signing key, loaded once
    let signing_key = load_signing_key(&config)?;
    tracing::info!(
        public_key = %signing_key.public_key_hex(),
        "ledger signing key loaded"
    );

    // Stores and directories
    let store = Arc::new(MemoryStore::new());
    let meetings = MeetingDirectory::new();
    let participants = ParticipantDirectory::new();
    let passwords = PasswordService::default();

    if let Some(path) = &config.fixtures_file {
        fixtures::seed(path, &meetings, &participants, &passwords).await?;
    }

    // The lifecycle engine
    let engine = AttendanceEngine::new(
        store,
        meetings,
        participants,
        HostCodeStore::new(),
        Arc::new(signing_key),
        Arc::new(LogSink),
        EngineConfig {
            frontend_base: config.frontend_base.clone(),
            ..EngineConfig::default()
        },
    );

    // Background sweeper: first pass fires immediately
    let sweeper = FinalizationSweeper::new(engine.clone(), config.sweep_interval());
    let sweeper_handle = sweeper.spawn();
    tracing::info!(
        interval_secs = config.sweep_interval_secs,
        "finalization sweeper started"
    );

    // HTTP surface
    let state = Arc::new(AppState::new(
        engine,
        SessionService::default(),
        passwords,
        WebhookVerifier::new(config.webhook_secret.clone()),
    ));
    let app = create_router(state, ApiConfig::default());

    let addr = config.socket_addr()?;
    tracing::info!(host = %config.host, port = config.port, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout()))
        .await?;

    sweeper_handle.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

// =============================================================================
// Initialization
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.log_format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    Ok(())
}

/// Load the process signing key, or generate an ephemeral one.
///
/// An ephemeral key still signs valid chains, but they will not verify
/// across restarts; production deployments must persist a seed file.
fn load_signing_key(config: &ServerConfig) -> anyhow::Result<SigningKeypair> {
    match &config.signing_key_file {
        Some(path) => {
            let seed_hex = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("cannot read signing key file {path}: {e}"))?;
            let key = SigningKeypair::from_seed_hex(&seed_hex)
                .map_err(|e| anyhow::anyhow!("invalid signing key in {path}: {e}"))?;
            Ok(key)
        }
        None => {
            tracing::warn!("no signing key file configured; generating an ephemeral key");
            Ok(SigningKeypair::generate())
        }
    }
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );
    tokio::time::sleep(timeout).await;
}

// =============================================================================
// Tests
// =============================================================================
