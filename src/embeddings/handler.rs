use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, error};

use super::dto::{EmbedRequest, EmbedResponse};
use super::prefix::apply_prefix;
use crate::api::AppState;

pub async fn embed_handler(
    State(state): State<AppState>,
    Json(req): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, (StatusCode, String)> {
    if let Some(max) = state.max_batch {
        if req.texts.len() > max {
            return Err((StatusCode::BAD_REQUEST, "too_many_texts".into()));
        }
    }
    if req.texts.is_empty() {
        return Ok(Json(EmbedResponse {
            embeddings: Vec::new(),
        }));
    }

    let prefixed = apply_prefix(&req.texts, req.text_type);
    debug!(
        count = prefixed.len(),
        text_type = ?req.text_type,
        "embedding batch"
    );

    let embedder = state.embedder.clone();
    let embeddings = tokio::task::spawn_blocking(move || embedder.encode(&prefixed, true))
        .await
        .map_err(|err| {
            error!("embedding task failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?
        .map_err(|err| {
            error!("embedding failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;

    Ok(Json(EmbedResponse { embeddings }))
}
