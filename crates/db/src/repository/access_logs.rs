//! `access_logs` table — one row per HTTP request, inserted by the `api`
//! crate's middleware pipeline (spec §6.1).

use sqlx::PgPool;

use crate::DbError;

pub async fn insert(
    pool: &PgPool,
    host: &str,
    authorized: bool,
    identifier: Option<&str>,
    path: &str,
    method: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO access_logs (host, authorized, identifier, path, method) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(host)
    .bind(authorized)
    .bind(identifier)
    .bind(path)
    .bind(method)
    .execute(pool)
    .await?;

    Ok(())
}
