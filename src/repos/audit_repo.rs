//! Repository for the audit trail
//!
//! Every mutating operation writes one audit row inside the same
//! transaction as the change itself.

use sqlx::{Postgres, Transaction};

pub async fn log(
    tx: &mut Transaction<'_, Postgres>,
    entity_type: &str,
    entity_id: Option<i64>,
    action: &str,
    old_data: Option<&str>,
    new_data: Option<&str>,
    changed_by: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (entity_type, entity_id, action, old_data, new_data, changed_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(old_data)
    .bind(new_data)
    .bind(changed_by)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
