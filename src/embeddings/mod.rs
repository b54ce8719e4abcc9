pub mod dto;
pub mod handler;
pub mod prefix;

use axum::{routing::post, Router};

use crate::api::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/embed", post(handler::embed_handler))
}
