//! Serve command handler.
//!
//! Boots the pipeline and exposes it over HTTP. A failed bootstrap does not
//! stop the server: query routes answer "not initialized" until restart.

use anyhow::Context;
use clap::Args;
use comai_core::config::AppConfig;
use comai_rag::bootstrap;
use tokio::net::TcpListener;

use crate::http::{self, AppState};

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Listen address (default: 0.0.0.0:8000)
    #[arg(short, long, env = "COMAI_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing serve command");

        let handle = bootstrap(config).await;
        if !handle.is_ready() {
            tracing::warn!("Serving without a pipeline; query requests will be rejected");
        }

        let router = http::router(AppState::new(handle));

        let listener = TcpListener::bind(&config.server.bind)
            .await
            .with_context(|| format!("Failed to bind {}", config.server.bind))?;

        tracing::info!("ComAI listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
