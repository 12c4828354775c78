//! Repository for upload batches, staging rows and canonical transactions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::contracts::recon_v1::RemittanceRow;
use crate::contracts::uploads_v1::{InvalidRecordRow, LedgerBatchRow, VendorBatchRow};

/// Canonical transaction as stored, used by reconciliation and charges.
#[derive(Debug, Clone, FromRow)]
pub struct CanonicalTxn {
    pub canonical_id: i64,
    pub source: String,
    pub bank_store_code: String,
    pub vendor_store_code: Option<String>,
    pub account_no: Option<String>,
    pub customer_id: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub remittance_date: Option<NaiveDate>,
    pub pickup_amount: Option<Decimal>,
    pub remittance_amount: Option<Decimal>,
    pub pickup_type: Option<String>,
    pub raw_batch_id: i64,
}

/// Insert payload for a canonical transaction.
#[derive(Debug, Clone)]
pub struct CanonicalInsert {
    pub source: &'static str,
    pub bank_store_code: String,
    pub vendor_store_code: Option<String>,
    pub account_no: Option<String>,
    pub customer_id: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub remittance_date: Option<NaiveDate>,
    pub pickup_amount: Option<Decimal>,
    pub remittance_amount: Option<Decimal>,
    pub pickup_type: Option<String>,
    pub raw_batch_id: i64,
}

// ============================================================
// Batches
// ============================================================

pub async fn find_ledger_batch(
    pool: &PgPool,
    mis_date: NaiveDate,
) -> Result<Option<LedgerBatchRow>, sqlx::Error> {
    sqlx::query_as::<_, LedgerBatchRow>(
        r#"
        SELECT batch_id, mis_date, file_name, uploaded_by, uploaded_at, status
        FROM ledger_upload_batch
        WHERE mis_date = $1
        "#,
    )
    .bind(mis_date)
    .fetch_optional(pool)
    .await
}

pub async fn insert_ledger_batch(
    tx: &mut Transaction<'_, Postgres>,
    mis_date: NaiveDate,
    file_name: &str,
    uploaded_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO ledger_upload_batch (mis_date, file_name, uploaded_by, status)
        VALUES ($1, $2, $3, 'RECEIVED')
        RETURNING batch_id
        "#,
    )
    .bind(mis_date)
    .bind(file_name)
    .bind(uploaded_by)
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_ledger_batch_status(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE ledger_upload_batch SET status = $2 WHERE batch_id = $1")
        .bind(batch_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn find_vendor_batch(
    pool: &PgPool,
    vendor_id: i64,
    mis_date: NaiveDate,
) -> Result<Option<VendorBatchRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorBatchRow>(
        r#"
        SELECT batch_id, vendor_id, mis_date, file_name, uploaded_by, uploaded_at, status
        FROM vendor_upload_batch
        WHERE vendor_id = $1 AND mis_date = $2
        "#,
    )
    .bind(vendor_id)
    .bind(mis_date)
    .fetch_optional(pool)
    .await
}

pub async fn insert_vendor_batch(
    tx: &mut Transaction<'_, Postgres>,
    vendor_id: i64,
    mis_date: NaiveDate,
    file_name: &str,
    uploaded_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_upload_batch (vendor_id, mis_date, file_name, uploaded_by, status)
        VALUES ($1, $2, $3, $4, 'RECEIVED')
        RETURNING batch_id
        "#,
    )
    .bind(vendor_id)
    .bind(mis_date)
    .bind(file_name)
    .bind(uploaded_by)
    .fetch_one(&mut **tx)
    .await
}

pub async fn update_vendor_batch_status(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE vendor_upload_batch SET status = $2 WHERE batch_id = $1")
        .bind(batch_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Remove a failed vendor batch and everything hanging off it so the same
/// (vendor, date) slot can be re-uploaded.
pub async fn purge_vendor_batch(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM remittance_entries
        WHERE canonical_id IN (
            SELECT canonical_id FROM canonical_transactions
            WHERE raw_batch_id = $1 AND source = 'VENDOR'
        )
        "#,
    )
    .bind(batch_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM canonical_transactions WHERE raw_batch_id = $1 AND source = 'VENDOR'")
        .bind(batch_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM vendor_invalid_records WHERE batch_id = $1")
        .bind(batch_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM vendor_raw_staging WHERE batch_id = $1")
        .bind(batch_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM vendor_upload_batch WHERE batch_id = $1")
        .bind(batch_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn list_ledger_batches(pool: &PgPool) -> Result<Vec<LedgerBatchRow>, sqlx::Error> {
    sqlx::query_as::<_, LedgerBatchRow>(
        r#"
        SELECT batch_id, mis_date, file_name, uploaded_by, uploaded_at, status
        FROM ledger_upload_batch
        ORDER BY mis_date DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_vendor_batches(pool: &PgPool) -> Result<Vec<VendorBatchRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorBatchRow>(
        r#"
        SELECT batch_id, vendor_id, mis_date, file_name, uploaded_by, uploaded_at, status
        FROM vendor_upload_batch
        ORDER BY mis_date DESC, vendor_id
        "#,
    )
    .fetch_all(pool)
    .await
}

// ============================================================
// Staging and quarantine
// ============================================================

pub async fn insert_ledger_raw(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    row_number: i64,
    payload: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ledger_raw_staging (batch_id, row_number, row_payload) VALUES ($1, $2, $3)",
    )
    .bind(batch_id)
    .bind(row_number)
    .bind(payload)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_vendor_raw(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    row_number: i64,
    payload: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO vendor_raw_staging (batch_id, row_number, row_payload) VALUES ($1, $2, $3)",
    )
    .bind(batch_id)
    .bind(row_number)
    .bind(payload)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_ledger_invalid(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    row_number: i64,
    reason: &str,
    payload: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ledger_invalid_records (batch_id, row_number, reason, row_payload)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(batch_id)
    .bind(row_number)
    .bind(reason)
    .bind(payload)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn insert_vendor_invalid(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: i64,
    row_number: i64,
    reason: &str,
    payload: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO vendor_invalid_records (batch_id, row_number, reason, row_payload)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(batch_id)
    .bind(row_number)
    .bind(reason)
    .bind(payload)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_ledger_invalid(
    pool: &PgPool,
    batch_id: i64,
) -> Result<Vec<InvalidRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, InvalidRecordRow>(
        r#"
        SELECT invalid_id, batch_id, row_number, reason, row_payload
        FROM ledger_invalid_records
        WHERE batch_id = $1
        ORDER BY row_number
        "#,
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await
}

pub async fn list_vendor_invalid(
    pool: &PgPool,
    batch_id: i64,
) -> Result<Vec<InvalidRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, InvalidRecordRow>(
        r#"
        SELECT invalid_id, batch_id, row_number, reason, row_payload
        FROM vendor_invalid_records
        WHERE batch_id = $1
        ORDER BY row_number
        "#,
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await
}

// ============================================================
// Canonical transactions
// ============================================================

pub async fn insert_canonical(
    tx: &mut Transaction<'_, Postgres>,
    row: &CanonicalInsert,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO canonical_transactions
            (source, bank_store_code, vendor_store_code, account_no, customer_id,
             pickup_date, remittance_date, pickup_amount, remittance_amount,
             pickup_type, raw_batch_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING canonical_id
        "#,
    )
    .bind(row.source)
    .bind(&row.bank_store_code)
    .bind(&row.vendor_store_code)
    .bind(&row.account_no)
    .bind(&row.customer_id)
    .bind(row.pickup_date)
    .bind(row.remittance_date)
    .bind(row.pickup_amount)
    .bind(row.remittance_amount)
    .bind(&row.pickup_type)
    .bind(row.raw_batch_id)
    .fetch_one(&mut **tx)
    .await
}

/// Ledger rows of one ingested batch; a batch may carry transactions dated
/// across several business days.
pub async fn ledger_txns_for_batch(
    pool: &PgPool,
    batch_id: i64,
) -> Result<Vec<CanonicalTxn>, sqlx::Error> {
    sqlx::query_as::<_, CanonicalTxn>(
        r#"
        SELECT canonical_id, source, bank_store_code, vendor_store_code, account_no,
               customer_id, pickup_date, remittance_date, pickup_amount, remittance_amount,
               pickup_type, raw_batch_id
        FROM canonical_transactions
        WHERE source = 'FINACLE'
          AND raw_batch_id = $1
        "#,
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await
}

/// Vendor rows from every batch uploaded for an MIS date, whatever dates the
/// rows themselves carry.
pub async fn vendor_txns_for_mis_date(
    pool: &PgPool,
    mis_date: NaiveDate,
) -> Result<Vec<VendorMonthTxn>, sqlx::Error> {
    sqlx::query_as::<_, VendorMonthTxn>(
        r#"
        SELECT ct.canonical_id, vub.vendor_id, ct.bank_store_code, ct.vendor_store_code,
               ct.customer_id, ct.pickup_date, ct.remittance_date, ct.pickup_amount,
               ct.remittance_amount, ct.pickup_type
        FROM canonical_transactions ct
        JOIN vendor_upload_batch vub ON vub.batch_id = ct.raw_batch_id
        WHERE ct.source = 'VENDOR'
          AND vub.mis_date = $1
        "#,
    )
    .bind(mis_date)
    .fetch_all(pool)
    .await
}

/// Vendor transaction joined with its batch's vendor.
#[derive(Debug, Clone, FromRow)]
pub struct VendorMonthTxn {
    pub canonical_id: i64,
    pub vendor_id: i64,
    pub bank_store_code: String,
    pub vendor_store_code: Option<String>,
    pub customer_id: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub remittance_date: Option<NaiveDate>,
    pub pickup_amount: Option<Decimal>,
    pub remittance_amount: Option<Decimal>,
    pub pickup_type: Option<String>,
}

pub async fn vendor_txns_for_month(
    pool: &PgPool,
    first_day: NaiveDate,
    last_day: NaiveDate,
) -> Result<Vec<VendorMonthTxn>, sqlx::Error> {
    sqlx::query_as::<_, VendorMonthTxn>(
        r#"
        SELECT ct.canonical_id, vub.vendor_id, ct.bank_store_code, ct.vendor_store_code,
               ct.customer_id, ct.pickup_date, ct.remittance_date, ct.pickup_amount,
               ct.remittance_amount, ct.pickup_type
        FROM canonical_transactions ct
        JOIN vendor_upload_batch vub ON vub.batch_id = ct.raw_batch_id
        WHERE ct.source = 'VENDOR'
          AND ct.pickup_date BETWEEN $1 AND $2
        "#,
    )
    .bind(first_day)
    .bind(last_day)
    .fetch_all(pool)
    .await
}

/// Business date of a canonical transaction, remittance side first.
pub async fn canonical_base_date(
    pool: &PgPool,
    canonical_id: i64,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<NaiveDate>>(
        r#"
        SELECT COALESCE(remittance_date, pickup_date)
        FROM canonical_transactions
        WHERE canonical_id = $1
        "#,
    )
    .bind(canonical_id)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}

// ============================================================
// Remittance entries
// ============================================================

pub async fn insert_remittance_entry(
    tx: &mut Transaction<'_, Postgres>,
    canonical_id: i64,
    source: &str,
    created_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO remittance_entries (canonical_id, source, status, created_by)
        VALUES ($1, $2, 'UPLOADED', $3)
        RETURNING remittance_id
        "#,
    )
    .bind(canonical_id)
    .bind(source)
    .bind(created_by)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_remittance(
    pool: &PgPool,
    remittance_id: i64,
) -> Result<Option<RemittanceRow>, sqlx::Error> {
    sqlx::query_as::<_, RemittanceRow>(
        r#"
        SELECT remittance_id, canonical_id, source, status, rejection_reason,
               created_by, created_date, approved_by, approved_date, closed_date
        FROM remittance_entries
        WHERE remittance_id = $1
        "#,
    )
    .bind(remittance_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_remittances(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<RemittanceRow>, sqlx::Error> {
    match status {
        Some(s) => {
            sqlx::query_as::<_, RemittanceRow>(
                r#"
                SELECT remittance_id, canonical_id, source, status, rejection_reason,
                       created_by, created_date, approved_by, approved_date, closed_date
                FROM remittance_entries
                WHERE status = $1
                ORDER BY remittance_id DESC
                "#,
            )
            .bind(s)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, RemittanceRow>(
                r#"
                SELECT remittance_id, canonical_id, source, status, rejection_reason,
                       created_by, created_date, approved_by, approved_date, closed_date
                FROM remittance_entries
                ORDER BY remittance_id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn update_remittance_status(
    tx: &mut Transaction<'_, Postgres>,
    remittance_id: i64,
    status: &str,
    actor: &str,
    rejection_reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE remittance_entries
        SET status = $2,
            rejection_reason = COALESCE($4, rejection_reason),
            approved_by = CASE WHEN $2 IN ('APPROVED', 'REJECTED') THEN $3 ELSE approved_by END,
            approved_date = CASE WHEN $2 IN ('APPROVED', 'REJECTED') THEN NOW() ELSE approved_date END,
            closed_date = CASE WHEN $2 = 'CLOSED' THEN NOW() ELSE closed_date END
        WHERE remittance_id = $1
        "#,
    )
    .bind(remittance_id)
    .bind(status)
    .bind(actor)
    .bind(rejection_reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
