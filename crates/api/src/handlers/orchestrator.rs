//! `/orchestrator/*` — lifecycle control (spec §6.1).

use axum::extract::State;
use axum::http::StatusCode;
use engine::ErrorCode;
use tracing::error;

use crate::AppState;

async fn read_config_blobs(state: &AppState) -> Result<(Vec<u8>, Vec<u8>), StatusCode> {
    let nodes = tokio::fs::read(&state.nodes_path).await.map_err(|e| {
        error!("failed to read nodes config '{}': {}", state.nodes_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let workflows = tokio::fs::read(&state.workflows_path).await.map_err(|e| {
        error!("failed to read workflows config '{}': {}", state.workflows_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((nodes, workflows))
}

pub async fn start(State(state): State<AppState>) -> StatusCode {
    let (nodes_blob, workflows_blob) = match read_config_blobs(&state).await {
        Ok(blobs) => blobs,
        Err(status) => return status,
    };

    match state.orchestrator.start(&nodes_blob, &workflows_blob).await {
        ErrorCode::Ok => StatusCode::NO_CONTENT,
        ErrorCode::Cancelled => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn stop(State(state): State<AppState>) -> StatusCode {
    match state.orchestrator.stop().await {
        ErrorCode::Ok => StatusCode::NO_CONTENT,
        ErrorCode::Cancelled => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn status(State(state): State<AppState>) -> StatusCode {
    if state.orchestrator.is_running().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::GONE
    }
}
