pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod scim;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::client::ScimClient;
use crate::config::AppConfig;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: ScimClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, scim::ScimError> {
        let client = ScimClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// Router: health probe plus a catch-all that proxies everything else downstream
pub fn app(state: AppState) -> Router {
    let max_body = state.config.api.max_request_size_bytes;

    Router::new()
        .route("/health", get(handlers::health_get))
        .fallback(handlers::proxy_forward)
        .with_state(state)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body)),
        )
}
