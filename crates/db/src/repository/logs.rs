//! `logs` table — structured log sink, fed by `db::logs::DbLogLayer` (a
//! `tracing_subscriber::Layer`), mirroring
//! `original_source/database/logs.py::DBLogs.db_sink`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{models::LogRow, DbError};

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &PgPool,
    timestamp: DateTime<Utc>,
    logger_name: &str,
    log_level: &str,
    module: &str,
    caller: &str,
    line: i32,
    message: &str,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO logs (timestamp, logger_name, log_level, module, caller, line, message)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(timestamp)
    .bind(logger_name)
    .bind(log_level)
    .bind(module)
    .bind(caller)
    .bind(line)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent 1000 log rows, oldest first — matches
/// `original_source/database/logs.py::get_all`.
pub async fn get_recent(pool: &PgPool) -> Result<Vec<LogRow>, DbError> {
    let rows = sqlx::query_as::<_, LogRow>(
        r#"
        SELECT * FROM (
            SELECT id, timestamp, logger_name, log_level, module, caller, line, message
            FROM logs
            ORDER BY timestamp DESC
            LIMIT 1000
        ) recent
        ORDER BY timestamp
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
