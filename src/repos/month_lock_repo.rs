//! Repository for month lock state
//!
//! Absence of a row means the month is open.

use sqlx::{PgPool, Postgres, Transaction};

use crate::contracts::month_lock_v1::MonthLockRow;

pub async fn is_locked(pool: &PgPool, month_key: &str) -> Result<bool, sqlx::Error> {
    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM month_lock WHERE month_key = $1",
    )
    .bind(month_key)
    .fetch_optional(pool)
    .await?;

    Ok(status.as_deref() == Some("LOCKED"))
}

/// Lock check usable inside a larger transaction, for approval effects that
/// mutate dated financial state.
pub async fn is_locked_tx(
    tx: &mut Transaction<'_, Postgres>,
    month_key: &str,
) -> Result<bool, sqlx::Error> {
    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM month_lock WHERE month_key = $1",
    )
    .bind(month_key)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(status.as_deref() == Some("LOCKED"))
}

pub async fn insert_lock(
    tx: &mut Transaction<'_, Postgres>,
    month_key: &str,
    locked_by: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO month_lock (month_key, status, locked_by, locked_at)
        VALUES ($1, 'LOCKED', $2, NOW())
        "#,
    )
    .bind(month_key)
    .bind(locked_by)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn list(pool: &PgPool) -> Result<Vec<MonthLockRow>, sqlx::Error> {
    sqlx::query_as::<_, MonthLockRow>(
        "SELECT lock_id, month_key, status, locked_by, locked_at FROM month_lock ORDER BY month_key DESC",
    )
    .fetch_all(pool)
    .await
}
