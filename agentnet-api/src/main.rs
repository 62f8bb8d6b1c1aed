//! Agent Network Server Entry Point
//!
//! Loads configuration from the environment, starts the stale-agent sweep
//! and serves the JSON-RPC endpoint until Ctrl-C.

use agentnet_api::telemetry::init_tracing;
use agentnet_api::{
    create_router, liveness_sweep_task, NetworkConfig, NetworkService, RpcError, RpcResult,
};

#[tokio::main]
async fn main() -> RpcResult<()> {
    let config = NetworkConfig::from_env()?;
    init_tracing(&config.telemetry)?;

    let service = NetworkService::from_config(&config)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = config.sweep.enabled.then(|| {
        tokio::spawn(liveness_sweep_task(
            service.registry().clone(),
            config.sweep.clone(),
            shutdown_rx,
        ))
    });

    let app = create_router(service, &config);

    let addr = config.bind_addr()?;
    tracing::info!(%addr, probe = %config.liveness_probe, "Starting Agent Network server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RpcError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| RpcError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Liveness sweep task did not stop cleanly");
        }
    }
    Ok(())
}
