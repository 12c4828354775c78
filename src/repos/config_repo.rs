//! Repository for charge configuration lookups
//!
//! Configuration values are versioned; a lookup resolves the single ACTIVE
//! row whose effective interval contains the as-of date, newest first.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Resolve a numeric configuration value as of a date
pub async fn resolve_number(
    pool: &PgPool,
    config_code: &str,
    as_of: NaiveDate,
) -> Result<Option<Decimal>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<Decimal>>(
        r#"
        SELECT value_number
        FROM charge_configuration_master
        WHERE config_code = $1
          AND status = 'ACTIVE'
          AND effective_from <= $2
          AND (effective_to IS NULL OR effective_to >= $2)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(config_code)
    .bind(as_of)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}

/// Resolve a text configuration value as of a date
pub async fn resolve_text(
    pool: &PgPool,
    config_code: &str,
    as_of: NaiveDate,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT value_text
        FROM charge_configuration_master
        WHERE config_code = $1
          AND status = 'ACTIVE'
          AND effective_from <= $2
          AND (effective_to IS NULL OR effective_to >= $2)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(config_code)
    .bind(as_of)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}
