//! `/task/*` — submission, pause/continue, and status (spec §6.1).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use db::models::{TaskRow, WorkflowRow};
use engine::{ErrorCode, TaskSnapshot};

use crate::{validation, AppState};

#[derive(Debug, Deserialize)]
pub struct SubmitTaskDto {
    pub workflow_id: i64,
    #[serde(default)]
    pub args: Option<Value>,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitTaskDto>,
) -> Result<Json<TaskSnapshot>, StatusCode> {
    if !state.orchestrator.is_running().await {
        return Err(StatusCode::IM_A_TEAPOT);
    }

    let workflow = state.orchestrator.get_workflow(payload.workflow_id).await.ok_or(StatusCode::NOT_FOUND)?;

    if let Some(schema) = &workflow.args_schema {
        let args = payload.args.clone().unwrap_or_else(|| serde_json::json!({}));
        if let Err(reason) = validation::validate(schema, &args) {
            tracing::warn!("task submission rejected: {}", reason);
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let task = state.orchestrator.add_task(payload.workflow_id, payload.args).await.map_err(|code| match code {
        ErrorCode::ContentNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    })?;

    Ok(Json(task.serialize().await))
}

pub async fn running(State(state): State<AppState>) -> Json<Vec<TaskSnapshot>> {
    let tasks = state.orchestrator.running_tasks().await;
    let mut snapshots = Vec::with_capacity(tasks.len());
    for task in tasks {
        snapshots.push(task.serialize().await);
    }
    Json(snapshots)
}

pub async fn pause(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    match state.orchestrator.pause_task(id).await {
        ErrorCode::Ok => StatusCode::NO_CONTENT,
        ErrorCode::ContentNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn continue_(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    match state.orchestrator.continue_task(id).await {
        ErrorCode::Ok => StatusCode::NO_CONTENT,
        ErrorCode::ContentNotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub task: TaskRow,
    pub workflow: WorkflowRow,
}

/// `204` if the task is unknown, matching spec §6.1 rather than the usual
/// `404` — a persisted task that has since aged out of the registry is not
/// treated as an error.
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<TaskDetail>, StatusCode> {
    let task = match db::repository::tasks::get(&state.pool, id).await {
        Ok(Some(row)) => row,
        Ok(None) => return Err(StatusCode::NO_CONTENT),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let workflow = db::repository::workflows::get(&state.pool, task.workflow_id)
        .await
        .map_err(|_| StatusCode::NO_CONTENT)?;

    Ok(Json(TaskDetail { task, workflow }))
}
