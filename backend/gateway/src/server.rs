//! Main HTTP gateway server.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use chatrelay_chat::ChatOrchestrator;

use crate::session_cookie::SessionSigner;
use crate::{chat_api, control_ui, health_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub signer: Arc<SessionSigner>,
}

impl GatewayState {
    pub fn new(orchestrator: ChatOrchestrator, signer: SessionSigner) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            signer: Arc::new(signer),
        }
    }
}

impl FromRef<GatewayState> for Arc<SessionSigner> {
    fn from_ref(state: &GatewayState) -> Self {
        state.signer.clone()
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(control_ui::index))
        .route("/api/chat", post(chat_api::chat))
        .route("/api/clear", post(chat_api::clear))
        .route("/api/health", get(health_api::get_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server and runs until Ctrl-C or SIGTERM.
#[instrument(skip(state))]
pub async fn start_server(addr: &str, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
