//! API Server - HTTP server for the classifier

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::history::SqliteHistory;
use crate::inference::InferenceService;

pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
}

impl ApiServer {
    pub fn new(inference: InferenceService, history: Arc<SqliteHistory>, addr: String) -> Self {
        let state = Arc::new(AppState { inference, history });
        Self { state, addr }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let api_routes = Router::new()
            .route("/check", post(handlers::check))
            .route("/history", get(handlers::list_history))
            .route("/history/:id", delete(handlers::delete_history))
            .route("/model", get(handlers::model_info))
            .route("/model/reload", post(handlers::reload_model));

        Router::new()
            .route("/health", get(handlers::health))
            .nest("/api", api_routes)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }

    /// Start the API server
    pub async fn run(&self) -> std::io::Result<()> {
        let router = self.router();

        info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
