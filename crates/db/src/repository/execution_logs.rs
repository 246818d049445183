//! `execution_logs` table — the `ExecutionRecord` of spec §3: one row per
//! node invocation, plus the synthetic `"w. acc."` gate-wait row per step.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ExecutionLogRow, DbError};

pub async fn insert(
    pool: &PgPool,
    task_id: Uuid,
    workflow_id: i64,
    name: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO execution_logs (task_id, workflow_id, name, start, \"end\") VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(task_id)
    .bind(workflow_id)
    .bind(name)
    .bind(start)
    .bind(end)
    .execute(pool)
    .await?;

    Ok(())
}

/// Rows from the last 8 hours, matching
/// `original_source/database/execution_logs.py::get`. This is what feeds
/// the flame-chart visualizer (out of core scope, spec §1) — the data shape
/// is the core's job, the chart is not.
pub async fn get_recent(pool: &PgPool) -> Result<Vec<ExecutionLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ExecutionLogRow>(
        r#"
        SELECT id, task_id, workflow_id, name, start, "end"
        FROM execution_logs
        WHERE start >= now() - interval '8 hours'
        ORDER BY start
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
