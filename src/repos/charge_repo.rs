//! Repository for monthly charge summaries

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::contracts::charges_v1::{CustomerChargeSummaryRow, VendorChargeSummaryRow};

pub async fn vendor_summary_exists_for(
    pool: &PgPool,
    vendor_id: i64,
    month_key: &str,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM vendor_charge_summary WHERE vendor_id = $1 AND month_key = $2",
    )
    .bind(vendor_id)
    .bind(month_key)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn customer_summary_exists(
    pool: &PgPool,
    month_key: &str,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM customer_charge_summary WHERE month_key = $1",
    )
    .bind(month_key)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Computed figures for one vendor month.
#[derive(Debug, Clone)]
pub struct VendorSummaryInsert {
    pub vendor_id: i64,
    pub month_key: String,
    pub beat_pickups: i64,
    pub call_pickups: i64,
    pub base_charge_amount: Decimal,
    pub enhancement_charge: Decimal,
    pub tax_amount: Decimal,
    pub total_charge_amount: Decimal,
    pub total_with_tax: Decimal,
}

pub async fn insert_vendor_summary(
    tx: &mut Transaction<'_, Postgres>,
    row: &VendorSummaryInsert,
    computed_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_charge_summary
            (vendor_id, month_key, beat_pickups, call_pickups, base_charge_amount,
             enhancement_charge, tax_amount, total_charge_amount, total_with_tax,
             status, computed_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'COMPUTED', $10)
        RETURNING summary_id
        "#,
    )
    .bind(row.vendor_id)
    .bind(&row.month_key)
    .bind(row.beat_pickups)
    .bind(row.call_pickups)
    .bind(row.base_charge_amount)
    .bind(row.enhancement_charge)
    .bind(row.tax_amount)
    .bind(row.total_charge_amount)
    .bind(row.total_with_tax)
    .bind(computed_by)
    .fetch_one(&mut **tx)
    .await
}

/// Computed figures for one customer month.
#[derive(Debug, Clone)]
pub struct CustomerSummaryInsert {
    pub customer_id: String,
    pub month_key: String,
    pub total_remittance: Decimal,
    pub base_charge_amount: Decimal,
    pub enhancement_charge: Decimal,
    pub waiver_amount: Decimal,
    pub net_charge_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_with_tax: Decimal,
}

pub async fn insert_customer_summary(
    tx: &mut Transaction<'_, Postgres>,
    row: &CustomerSummaryInsert,
    computed_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO customer_charge_summary
            (customer_id, month_key, total_remittance, base_charge_amount,
             enhancement_charge, waiver_amount, net_charge_amount, tax_amount,
             total_with_tax, status, computed_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'COMPUTED', $10)
        RETURNING summary_id
        "#,
    )
    .bind(&row.customer_id)
    .bind(&row.month_key)
    .bind(row.total_remittance)
    .bind(row.base_charge_amount)
    .bind(row.enhancement_charge)
    .bind(row.waiver_amount)
    .bind(row.net_charge_amount)
    .bind(row.tax_amount)
    .bind(row.total_with_tax)
    .bind(computed_by)
    .fetch_one(&mut **tx)
    .await
}

pub async fn list_vendor_summaries(
    pool: &PgPool,
    month_key: Option<&str>,
) -> Result<Vec<VendorChargeSummaryRow>, sqlx::Error> {
    match month_key {
        Some(m) => {
            sqlx::query_as::<_, VendorChargeSummaryRow>(
                r#"
                SELECT summary_id, vendor_id, month_key, beat_pickups, call_pickups,
                       base_charge_amount, enhancement_charge, tax_amount,
                       total_charge_amount, total_with_tax, status, computed_by, computed_at
                FROM vendor_charge_summary
                WHERE month_key = $1
                ORDER BY vendor_id
                "#,
            )
            .bind(m)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, VendorChargeSummaryRow>(
                r#"
                SELECT summary_id, vendor_id, month_key, beat_pickups, call_pickups,
                       base_charge_amount, enhancement_charge, tax_amount,
                       total_charge_amount, total_with_tax, status, computed_by, computed_at
                FROM vendor_charge_summary
                ORDER BY month_key DESC, vendor_id
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn list_customer_summaries(
    pool: &PgPool,
    month_key: Option<&str>,
) -> Result<Vec<CustomerChargeSummaryRow>, sqlx::Error> {
    match month_key {
        Some(m) => {
            sqlx::query_as::<_, CustomerChargeSummaryRow>(
                r#"
                SELECT summary_id, customer_id, month_key, total_remittance,
                       base_charge_amount, enhancement_charge, waiver_amount,
                       net_charge_amount, tax_amount, total_with_tax, status,
                       computed_by, computed_at
                FROM customer_charge_summary
                WHERE month_key = $1
                ORDER BY customer_id
                "#,
            )
            .bind(m)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, CustomerChargeSummaryRow>(
                r#"
                SELECT summary_id, customer_id, month_key, total_remittance,
                       base_charge_amount, enhancement_charge, waiver_amount,
                       net_charge_amount, tax_amount, total_with_tax, status,
                       computed_by, computed_at
                FROM customer_charge_summary
                ORDER BY month_key DESC, customer_id
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}
