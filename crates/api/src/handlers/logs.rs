//! `/logs/`, `/logs/execution` — persisted log rows (spec §6.1).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use db::models::{ExecutionLogRow, LogRow};

use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<LogRow>>, StatusCode> {
    db::repository::logs::get_recent(&state.pool).await.map(Json).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn execution(State(state): State<AppState>) -> Result<Json<Vec<ExecutionLogRow>>, StatusCode> {
    db::repository::execution_logs::get_recent(&state.pool)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
