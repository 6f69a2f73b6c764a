//! # musicschool
//!
//! Interactive shell for the music school practice companion. Data lives in
//! a single SQLite database under the configured data directory.

mod repl;

use std::sync::Arc;

use musicschool_client::{AppState, ClientConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var), logs go to stderr
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "musicschool_cli=info,musicschool_client=debug,musicschool_store=info,warn",
            )
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!("Starting musicschool v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and open the local database
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let state = Arc::new(AppState::open(config)?);
    state.startup().await;

    // -----------------------------------------------------------------------
    // 3. Run the shell until `quit`, end of input or Ctrl+C
    // -----------------------------------------------------------------------
    tokio::select! {
        result = repl::run(state.clone()) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Shell failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    // A running session is saved before exit.
    if let Some(user) = state.auth.current_user() {
        if let Ok(Some(total)) = state.dashboard.stop_session(&user.uid).await {
            info!(total, "saved running session");
        }
    }

    Ok(())
}
