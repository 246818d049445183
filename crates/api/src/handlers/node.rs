//! `/node/*` — restart and status (spec §6.1).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use engine::{ErrorCode, NodeSnapshot};

use crate::AppState;

pub async fn restart(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.orchestrator.restart_node(&id).await {
        ErrorCode::Ok => StatusCode::NO_CONTENT,
        ErrorCode::ContentNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<NodeSnapshot>, StatusCode> {
    let node = state.orchestrator.get_node(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(node.serialize().await))
}
