mod api;
mod gateway;
mod languages;
mod runner;
mod shims;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::AppState;
use crate::gateway::ExecutionGateway;
use crate::runner::piston::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::runner::PistonClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("execution_gateway=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    // Load the runtime table
    let runtimes_path =
        std::env::var("RUNTIMES_CONFIG").unwrap_or_else(|_| "./files/runtimes.toml".into());
    languages::init_runtimes(&runtimes_path)?;
    info!("Loaded runtime table from {}", runtimes_path);

    // Execution provider client
    let base_url = std::env::var("RUNNER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let timeout_secs: u64 = std::env::var("RUNNER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let runner = PistonClient::new(&base_url, Duration::from_secs(timeout_secs))?;
    info!(
        "Execution provider at {} (timeout {}s)",
        base_url, timeout_secs
    );

    let state = AppState {
        gateway: Arc::new(ExecutionGateway::new(Arc::new(runner))),
    };

    let addr = std::env::var("GATEWAY_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Gateway listening on {}", addr);

    axum::serve(listener, api::router(state))
        .await
        .context("Server error")?;

    Ok(())
}
