use axum::Json;

use crate::api::types::HealthResponse;

/// The listener only starts after the model has loaded, so answering at all means ready.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
