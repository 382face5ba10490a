//! notifyhub gateway binary.
//!
//! - Config: `NOTIFYHUB_CONFIG` (default `notifyhub.yaml`, defaults if absent),
//!   `PORT` overrides the listen port
//! - Graceful shutdown on SIGINT/SIGTERM: readiness flips to draining and the
//!   hub drops every connection

use std::env;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use notifyhub_core::error::{NotifyError, Result};
use notifyhub_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "notifyhub-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = env::var("NOTIFYHUB_CONFIG").unwrap_or_else(|_| "notifyhub.yaml".into());
    let cfg = config::load_or_default(&path)?;
    let listen = cfg.server.listen_addr(env::var("PORT").ok().as_deref())?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| NotifyError::Internal(format!("failed to bind {listen}: {e}")))?;
    tracing::info!(%listen, service = %state.cfg().service.name, "notifyhub-gateway starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|e| NotifyError::Internal(format!("server failed: {e}")))?;

    tracing::info!("server exited");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down server");
    state.begin_shutdown();
}
