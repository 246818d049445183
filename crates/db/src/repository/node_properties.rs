//! `node_properties` table.

use sqlx::PgPool;

use crate::{models::NodePropertyRow, DbError};

/// Insert a property, skipping if the exact (node, name, value) triple
/// already exists — mirrors `original_source/database/node_property.py`.
pub async fn insert_property(
    pool: &PgPool,
    node_id: &str,
    name: &str,
    value: &str,
) -> Result<(), DbError> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM node_properties WHERE node_id = $1 AND name = $2 AND value = $3",
    )
    .bind(node_id)
    .bind(name)
    .bind(value)
    .fetch_optional(pool)
    .await?
    .is_some();

    if exists {
        return Ok(());
    }

    sqlx::query("INSERT INTO node_properties (node_id, name, value) VALUES ($1, $2, $3)")
        .bind(node_id)
        .bind(name)
        .bind(value)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_for_node(pool: &PgPool, node_id: &str) -> Result<Vec<NodePropertyRow>, DbError> {
    let rows = sqlx::query_as::<_, NodePropertyRow>(
        "SELECT id, node_id, name, value FROM node_properties WHERE node_id = $1",
    )
    .bind(node_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
