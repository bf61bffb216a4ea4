// crates/server/src/main.rs
//! PIM console server binary.

use anyhow::Result;
use clap::Parser;
use pim_console_observability::init_tracing;
use pim_console_server::{create_app, AppState, ServerConfig};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    let _log_guard = init_tracing(&config.log_config())?;

    eprintln!("\n  pim-console v{}\n", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.flush_interval(), !config.start_disabled);
    let app = create_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        flush_interval_ms = config.flush_interval_ms,
        tracking_enabled = !config.start_disabled,
        "Job tracker listening"
    );
    eprintln!("  \u{2192} http://{}\n", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
