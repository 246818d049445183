//! `nodes` table — node identity and persisted state.

use chrono::Utc;
use sqlx::PgPool;

use crate::{models::NodeRow, DbError};

/// Insert a node row if it doesn't already exist, a no-op otherwise —
/// config reload re-declares the same node ids across restarts.
pub async fn upsert(pool: &PgPool, id: &str, name: &str, node_state_id: i32) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO nodes (id, name, node_state_id, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(node_state_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a node's state transition. Spec §3: "the persisted
/// `node_state_id` reflects the in-memory state after every transition".
pub async fn set_state(pool: &PgPool, id: &str, node_state_id: i32) -> Result<(), DbError> {
    sqlx::query("UPDATE nodes SET node_state_id = $1, updated_at = $2 WHERE id = $3")
        .bind(node_state_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get(pool: &PgPool, id: &str) -> Result<NodeRow, DbError> {
    sqlx::query_as::<_, NodeRow>("SELECT id, name, node_state_id, updated_at FROM nodes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

pub async fn list(pool: &PgPool) -> Result<Vec<NodeRow>, DbError> {
    let rows = sqlx::query_as::<_, NodeRow>("SELECT id, name, node_state_id, updated_at FROM nodes")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
