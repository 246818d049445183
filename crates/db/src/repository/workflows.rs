//! `workflows` table — workflow identity, independent of its step list
//! (which lives in `steps`).

use sqlx::PgPool;

use crate::{models::WorkflowRow, DbError};

/// Insert or update a workflow row keyed by its config-supplied `id` —
/// mirrors `nodes::upsert` so config reload re-declaring the same workflow
/// id across restarts is idempotent.
pub async fn upsert(
    pool: &PgPool,
    id: i64,
    name: &str,
    source_node_id: &str,
    destination_node_id: &str,
    args: Option<serde_json::Value>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO workflows (id, name, source_node_id, destination_node_id, args)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            source_node_id = EXCLUDED.source_node_id,
            destination_node_id = EXCLUDED.destination_node_id,
            args = EXCLUDED.args
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(source_node_id)
    .bind(destination_node_id)
    .bind(args)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &PgPool, id: i64) -> Result<WorkflowRow, DbError> {
    sqlx::query_as::<_, WorkflowRow>(
        "SELECT id, name, source_node_id, destination_node_id, args FROM workflows WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

pub async fn list(pool: &PgPool) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as::<_, WorkflowRow>(
        "SELECT id, name, source_node_id, destination_node_id, args FROM workflows",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
