use std::sync::Arc;
use std::error::Error;
use tokio::net::TcpListener;
use axum::{Router, routing::{get, post}};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::dispatch::Dispatcher;
use super::routes;

/// State shared by every request handler
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// Builds the API router. Requests are accepted from any origin.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", get(routes::readiness))
        .route("/api/", get(routes::readiness))
        .route("/api/summarize", post(routes::summarize))
        .layer(cors)
        .with_state(state)
}

/// API Server for handling summarization requests
pub struct ApiServer {
    state: Arc<AppState>,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(dispatcher: Dispatcher, host: String, port: u16) -> Self {
        info!(
            "Creating new API server on {}:{} with models: {:?}",
            host,
            port,
            dispatcher.registry().names()
        );
        Self {
            state: Arc::new(AppState { dispatcher }),
            host,
            port,
        }
    }

    /// Serves until Ctrl-C or SIGTERM, then tears the registry down.
    pub async fn start(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app = router(Arc::clone(&self.state));

        info!("Starting server on {}:{}", self.host, self.port);
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;

        info!("Server started successfully");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down...");
        self.state.dispatcher.registry().teardown();
        Ok(())
    }
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
}
