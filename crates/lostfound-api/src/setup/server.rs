use anyhow::{Context, Result};
use axum::Router;
use lostfound_core::Config;
use lostfound_worker::TaskQueue;
use std::net::{Ipv4Addr, SocketAddr};

/// Serves until SIGINT or SIGTERM, then stops the task workers.
pub async fn start_server(config: &Config, app: Router, task_queue: Option<TaskQueue>) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        max_image_kb = config.max_image_size_bytes() / 1024,
        delivery_fee_cents = config.delivery_fee_cents(),
        currency = %config.payment_currency(),
        "Lost & Found API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(queue) = task_queue {
        queue.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn wait_for(kind: &'static str, signal: impl std::future::Future<Output = std::io::Result<()>>) -> &'static str {
    if let Err(e) = signal.await {
        // Without the handler this branch must never win the select below.
        tracing::error!(error = %e, signal = kind, "Cannot listen for signal");
        std::future::pending::<()>().await;
    }
    kind
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = wait_for("SIGTERM", async {
        let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        stream.recv().await;
        Ok(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        kind = wait_for("SIGINT", tokio::signal::ctrl_c()) => kind,
        kind = terminate => kind,
    };
    tracing::info!(signal = received, "Shutting down");
}
