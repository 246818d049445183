//! `/config/reload` — two uploaded files (`nodes`, `workflows`) re-run
//! through `Orchestrator::load_config` (spec §6.1). Refused with `428` while
//! any task is active, since reconfiguring mid-run would pull the rug out
//! from under a running workflow (spec §4.4, §9 Non-goals: no dynamic
//! reconfiguration while tasks are active).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use engine::ErrorCode;
use serde::Serialize;
use tracing::error;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub nodes: usize,
    pub workflows: usize,
}

pub async fn reload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<ReloadSummary>, StatusCode> {
    if !state.orchestrator.running_tasks().await.is_empty() {
        return Err(StatusCode::PRECONDITION_REQUIRED);
    }

    let mut nodes_blob: Option<Vec<u8>> = None;
    let mut workflows_blob: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("malformed multipart body: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        let name = field.name().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?.to_vec();
        match name.as_str() {
            "nodes" => nodes_blob = Some(data),
            "workflows" => workflows_blob = Some(data),
            _ => {}
        }
    }

    let nodes_blob = nodes_blob.ok_or(StatusCode::BAD_REQUEST)?;
    let workflows_blob = workflows_blob.ok_or(StatusCode::BAD_REQUEST)?;

    match state.orchestrator.load_config(&nodes_blob, &workflows_blob).await {
        ErrorCode::Ok => Ok(Json(ReloadSummary {
            nodes: state.orchestrator.list_nodes().await.len(),
            workflows: state.orchestrator.list_workflows().await.len(),
        })),
        ErrorCode::CouldNotFindConfiguration | ErrorCode::CouldNotParseConfiguration => Err(StatusCode::BAD_REQUEST),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
