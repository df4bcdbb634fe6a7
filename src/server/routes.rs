use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use super::response::{HealthResponse, ModelsResponse};
use super::AppState;
use crate::error::{FiestaError, Result};
use crate::llm::{DispatchRequest, DispatchResponse};

pub(super) async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    let Json(request) = payload.map_err(|rejection| FiestaError::validation(rejection.body_text()))?;
    debug!(models = ?request.models, "Received /api/chat request");

    let response = state.dispatcher.dispatch(request).await?;
    Ok(Json(response))
}

pub(super) async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.catalog.models().to_vec(),
        default_selection: state.catalog.default_selection(),
    })
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        upstream_configured: state.dispatcher.is_ready(),
    })
}
