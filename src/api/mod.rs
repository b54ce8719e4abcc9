use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::embeddings;
use crate::inference::TextEmbedder;

pub mod handlers;
pub mod types;

use handlers::health_handler;

#[derive(Clone)]
pub struct AppState {
    pub embedder: Arc<dyn TextEmbedder>,
    pub max_batch: Option<usize>,
    /// Request body limit in bytes. `None` lifts axum's default limit entirely.
    pub max_body_bytes: Option<usize>,
}

impl AppState {
    pub fn new(embedder: Arc<dyn TextEmbedder>, max_batch: Option<usize>) -> Self {
        Self {
            embedder,
            max_batch,
            max_body_bytes: None,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: Option<usize>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Full HTTP surface: `POST /embed`, `GET /health`, wide-open CORS.
pub fn app(state: AppState) -> Router {
    let body_limit = match state.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .merge(embeddings::router())
        .route("/health", get(health_handler))
        // Any origin/method/header. Restrict before exposing publicly.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
