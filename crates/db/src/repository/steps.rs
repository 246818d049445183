//! `steps` table — a workflow's ordered node list.

use sqlx::PgPool;

use crate::DbError;

pub async fn insert(pool: &PgPool, workflow_id: i64, node_id: &str, position: i32) -> Result<(), DbError> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM steps WHERE workflow_id = $1 AND node_id = $2 AND position = $3",
    )
    .bind(workflow_id)
    .bind(node_id)
    .bind(position)
    .fetch_optional(pool)
    .await?
    .is_some();

    if exists {
        return Ok(());
    }

    sqlx::query("INSERT INTO steps (node_id, workflow_id, position) VALUES ($1, $2, $3)")
        .bind(node_id)
        .bind(workflow_id)
        .bind(position)
        .execute(pool)
        .await?;

    Ok(())
}

/// `(position, node_name)` pairs for a workflow, ordered — used by the
/// `/workflow/` route (spec §6.1) to enumerate steps.
pub async fn list_for_workflow(pool: &PgPool, workflow_id: i64) -> Result<Vec<(i32, String)>, DbError> {
    let rows: Vec<(i32, String)> = sqlx::query_as(
        r#"
        SELECT steps.position, n.name
        FROM steps
        JOIN nodes n ON n.id = steps.node_id
        WHERE steps.workflow_id = $1
        ORDER BY steps.position
        "#,
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
