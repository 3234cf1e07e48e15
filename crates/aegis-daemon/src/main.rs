//! # aegis-daemon
//!
//! The Aegis gateway daemon: loads configuration and policies, attaches
//! the policy-directory watcher, and serves the HTTP surface.
//!
//! ## Usage
//!
//! ```text
//! aegis-daemon --config aegis.yaml
//! ```
//!
//! Logs go to stderr; stdout carries the audit record stream.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aegis_audit::AuditEmitter;
use aegis_gateway::{router, AdapterRouter, AppState, GatewayConfig};
use aegis_policy::{PolicyStore, PolicyWatcher};

/// Policy-enforcing reverse proxy for agent tool calls.
#[derive(Parser)]
#[command(name = "aegis-daemon", about = "Policy-enforcing gateway for agent tool calls")]
struct Cli {
    /// Path to the gateway configuration file.
    #[arg(long, default_value = "aegis.yaml")]
    config: PathBuf,

    /// Override the configured listen address.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs to stderr so they never interleave with audit records on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let listen = cli.listen.unwrap_or_else(|| config.listen.clone());

    // An unreadable policy directory aborts startup.
    let store = Arc::new(PolicyStore::open(&config.policy_dir)?);

    // A missing file sink degrades to stdout-only emission.
    let emitter = match AuditEmitter::open(&config.audit_log) {
        Ok(emitter) => emitter,
        Err(err) => {
            tracing::warn!(error = %err, "audit file sink unavailable, emitting to stdout only");
            AuditEmitter::stdout_only()
        }
    };

    let _watcher = PolicyWatcher::spawn(store.clone())?;

    let state = AppState::new(
        store,
        Arc::new(AdapterRouter::new(config.adapters.clone())),
        Arc::new(emitter),
    );

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid listen address '{}'", listen))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(addr = %addr, adapters = config.adapters.len(), "aegis gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("aegis gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
}
