//! HTTP server bootstrap and runtime wiring.

use anyhow::Context;
use tokio::net::TcpListener;

use crate::app::{self, services, snapshots};
use crate::config::AppConfig;

/// Run the server until SIGINT/SIGTERM, then write a final snapshot.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let services = services::build_services(&config).await?;

    let periodic = config
        .snapshot_path
        .clone()
        .map(|path| snapshots::spawn_periodic(services.clone(), path, config.snapshot_interval));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app::build_app(services.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    if let Some(handle) = periodic {
        handle.abort();
    }
    if let Some(path) = &config.snapshot_path {
        services
            .write_snapshot(path)
            .await
            .with_context(|| format!("failed to write final snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "final snapshot written");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
}
