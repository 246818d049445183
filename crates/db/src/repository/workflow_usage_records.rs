//! `workflow_usage_records` table — one row per `add_task` call (spec §4.4).

use sqlx::PgPool;

use crate::DbError;

pub async fn insert(pool: &PgPool, workflow_id: i64) -> Result<(), DbError> {
    sqlx::query("INSERT INTO workflow_usage_records (workflow_id, timestamp) VALUES ($1, now())")
        .bind(workflow_id)
        .execute(pool)
        .await?;

    Ok(())
}
