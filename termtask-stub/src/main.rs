//! `TermTask` stub backend -- in-memory REST server for local development.
//!
//! Implements the same endpoint contract as the real backend: bearer-token
//! auth with refresh rotation, and per-user task CRUD. All state is in
//! memory and dies with the process.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:4000
//! cargo run --bin termtask-stub
//!
//! # Run on custom address with short-lived access tokens
//! cargo run --bin termtask-stub -- --bind 127.0.0.1:8080 --access-ttl-secs 60
//!
//! # Or via environment variable
//! TERMTASK_STUB_ADDR=127.0.0.1:8080 cargo run --bin termtask-stub
//! ```

use std::sync::Arc;

use chrono::Duration;
use clap::Parser;

use termtask_stub::config::{StubCliArgs, StubConfig};
use termtask_stub::server::{self, StubState};
use termtask_stub::store::StubStore;

#[tokio::main]
async fn main() {
    let cli = StubCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match StubConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting termtask stub backend");

    let store = StubStore::new(
        duration_secs(config.access_ttl_secs),
        duration_secs(config.refresh_ttl_secs),
    );
    let state = Arc::new(StubState {
        store,
    });

    match server::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "stub backend listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "stub server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start stub server");
            std::process::exit(1);
        }
    }
}

/// Converts a seconds count from config into a chrono duration.
fn duration_secs(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}
