//! `tasks` table — grounded on `original_source/database/tasks.py`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::TaskRow, DbError};

/// Insert a new task row in `PENDING` (`task_state_id = 1`).
pub async fn insert(
    pool: &PgPool,
    id: Uuid,
    workflow_id: i64,
    args: Option<serde_json::Value>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO tasks (id, workflow_id, task_state_id, args, created_at, updated_at)
        VALUES ($1, $2, 1, $3, $4, $4)
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(args)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<TaskRow>, DbError> {
    let row = sqlx::query_as::<_, TaskRow>(
        "SELECT id, workflow_id, active_step, task_state_id, args, created_at, updated_at FROM tasks WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Set the currently-executing step (spec §4.3 step 3). `None` clears it,
/// as happens on both `set_error` and `set_finished`.
pub async fn update_active_step(pool: &PgPool, id: Uuid, active_step: Option<&str>) -> Result<(), DbError> {
    sqlx::query("UPDATE tasks SET active_step = $1, updated_at = $2 WHERE id = $3")
        .bind(active_step)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_active(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE tasks SET task_state_id = 2, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_error(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE tasks SET task_state_id = 4, active_step = NULL, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Mark the task ERROR without clearing `active_step` — used when a step
/// fails and the task parks for operator intervention (spec §4.3 step 5):
/// the active step is still meaningful until the operator issues `continue`
/// or `stop`, unlike the terminal exit `set_error` above.
pub async fn set_error_parked(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE tasks SET task_state_id = 4, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_finished(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    sqlx::query("UPDATE tasks SET task_state_id = 3, active_step = NULL, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_running(pool: &PgPool) -> Result<Vec<TaskRow>, DbError> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, workflow_id, active_step, task_state_id, args, created_at, updated_at FROM tasks WHERE task_state_id IN (1, 2)",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
