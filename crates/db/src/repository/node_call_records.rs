//! `node_call_records` table — per-instrument-call audit trail (spec §3).

use sqlx::PgPool;

use crate::{models::NodeCallRecordRow, DbError};

/// Insert a call record. `outcome` is `"success"` or `"error"` (spec §4.1
/// step 6/7).
pub async fn insert(
    pool: &PgPool,
    node_id: &str,
    endpoint: Option<&str>,
    message: Option<&str>,
    duration_seconds: f64,
    outcome: &str,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO node_call_records (node_id, endpoint, message, timestamp, duration, outcome)
        VALUES ($1, $2, $3, now(), $4, $5)
        "#,
    )
    .bind(node_id)
    .bind(endpoint)
    .bind(message)
    .bind(duration_seconds)
    .bind(outcome)
    .execute(pool)
    .await?;

    Ok(())
}

/// Call records for a node in the last 8 hours, matching
/// `original_source/database/node_call_record.py::get_for_node`.
pub async fn get_for_node(pool: &PgPool, node_id: &str) -> Result<Vec<NodeCallRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, NodeCallRecordRow>(
        r#"
        SELECT id, node_id, endpoint, message, timestamp, duration, outcome
        FROM node_call_records
        WHERE node_id = $1 AND timestamp >= now() - interval '8 hours'
        ORDER BY timestamp
        "#,
    )
    .bind(node_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
