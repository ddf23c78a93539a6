use crate::compactor::Compactor;
use crate::event::{InvocationResult, KinesisEvent};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpState {
    pub compactor: Arc<Compactor>,
    /// Request bodies above this are refused with 413.
    pub max_body_bytes: usize,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn post_invoke(
    State(state): State<HttpState>,
    Json(event): Json<KinesisEvent>,
) -> Result<Json<InvocationResult>, (StatusCode, String)> {
    let result = state
        .compactor
        .handle_event(&event)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(Json(result))
}

pub fn router(state: HttpState) -> Router {
    let limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/invoke", post(post_invoke))
        .layer(limit)
        .with_state(state)
}
