//! `/workflow/` — enumerate persisted workflows and their ordered steps
//! (spec §6.1).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WorkflowView {
    pub id: i64,
    pub name: String,
    pub source_node_id: String,
    pub destination_node_id: String,
    pub args: Option<serde_json::Value>,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Serialize)]
pub struct StepView {
    pub position: i32,
    pub node_name: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WorkflowView>>, StatusCode> {
    let rows = db::repository::workflows::list(&state.pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let steps = db::repository::steps::list_for_workflow(&state.pool, row.id)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .into_iter()
            .map(|(position, node_name)| StepView { position, node_name })
            .collect();

        views.push(WorkflowView {
            id: row.id,
            name: row.name,
            source_node_id: row.source_node_id,
            destination_node_id: row.destination_node_id,
            args: row.args,
            steps,
        });
    }

    Ok(Json(views))
}
