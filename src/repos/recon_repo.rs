//! Repository for reconciliation results and exception records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::contracts::recon_v1::{ExceptionRow, ReconResultRow};

/// Find the latest result for a store where either side's date matches.
/// Reruns update this row instead of inserting a duplicate.
pub async fn find_result_for(
    tx: &mut Transaction<'_, Postgres>,
    bank_store_code: &str,
    date: NaiveDate,
) -> Result<Option<ReconResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ReconResultRow>(
        r#"
        SELECT recon_id, bank_store_code, pickup_date, remittance_date,
               pickup_amount, remittance_amount, status, reason, created_date
        FROM reconciliation_results
        WHERE bank_store_code = $1
          AND (pickup_date = $2 OR remittance_date = $2)
        ORDER BY recon_id DESC
        LIMIT 1
        "#,
    )
    .bind(bank_store_code)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_result(
    tx: &mut Transaction<'_, Postgres>,
    bank_store_code: &str,
    pickup_date: Option<NaiveDate>,
    remittance_date: Option<NaiveDate>,
    pickup_amount: Option<Decimal>,
    remittance_amount: Option<Decimal>,
    status: &str,
    reason: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO reconciliation_results
            (bank_store_code, pickup_date, remittance_date, pickup_amount,
             remittance_amount, status, reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING recon_id
        "#,
    )
    .bind(bank_store_code)
    .bind(pickup_date)
    .bind(remittance_date)
    .bind(pickup_amount)
    .bind(remittance_amount)
    .bind(status)
    .bind(reason)
    .fetch_one(&mut **tx)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_result(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
    pickup_date: Option<NaiveDate>,
    remittance_date: Option<NaiveDate>,
    pickup_amount: Option<Decimal>,
    remittance_amount: Option<Decimal>,
    status: &str,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE reconciliation_results
        SET pickup_date = $2, remittance_date = $3, pickup_amount = $4,
            remittance_amount = $5, status = $6, reason = $7
        WHERE recon_id = $1
        "#,
    )
    .bind(recon_id)
    .bind(pickup_date)
    .bind(remittance_date)
    .bind(pickup_amount)
    .bind(remittance_amount)
    .bind(status)
    .bind(reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Amount-only rewrite used by approved corrections.
pub async fn update_result_amounts(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
    pickup_amount: Option<Decimal>,
    remittance_amount: Option<Decimal>,
    status: &str,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE reconciliation_results
        SET pickup_amount = COALESCE($2, pickup_amount),
            remittance_amount = COALESCE($3, remittance_amount),
            status = $4, reason = $5
        WHERE recon_id = $1
        "#,
    )
    .bind(recon_id)
    .bind(pickup_amount)
    .bind(remittance_amount)
    .bind(status)
    .bind(reason)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_result(
    pool: &PgPool,
    recon_id: i64,
) -> Result<Option<ReconResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ReconResultRow>(
        r#"
        SELECT recon_id, bank_store_code, pickup_date, remittance_date,
               pickup_amount, remittance_amount, status, reason, created_date
        FROM reconciliation_results
        WHERE recon_id = $1
        "#,
    )
    .bind(recon_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_result_tx(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
) -> Result<Option<ReconResultRow>, sqlx::Error> {
    sqlx::query_as::<_, ReconResultRow>(
        r#"
        SELECT recon_id, bank_store_code, pickup_date, remittance_date,
               pickup_amount, remittance_amount, status, reason, created_date
        FROM reconciliation_results
        WHERE recon_id = $1
        "#,
    )
    .bind(recon_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn list_results(
    pool: &PgPool,
    date: Option<NaiveDate>,
) -> Result<Vec<ReconResultRow>, sqlx::Error> {
    match date {
        Some(d) => {
            sqlx::query_as::<_, ReconResultRow>(
                r#"
                SELECT recon_id, bank_store_code, pickup_date, remittance_date,
                       pickup_amount, remittance_amount, status, reason, created_date
                FROM reconciliation_results
                WHERE pickup_date = $1 OR remittance_date = $1
                ORDER BY bank_store_code
                "#,
            )
            .bind(d)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ReconResultRow>(
                r#"
                SELECT recon_id, bank_store_code, pickup_date, remittance_date,
                       pickup_amount, remittance_amount, status, reason, created_date
                FROM reconciliation_results
                ORDER BY recon_id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

// ============================================================
// Exceptions
// ============================================================

pub async fn find_open_exception(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT exception_id FROM exception_records
        WHERE recon_id = $1 AND status = 'OPEN'
        ORDER BY exception_id
        LIMIT 1
        "#,
    )
    .bind(recon_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn insert_exception(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: Option<i64>,
    exception_type: &str,
    details: Option<&str>,
    created_by: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO exception_records (recon_id, exception_type, status, details, created_by)
        VALUES ($1, $2, 'OPEN', $3, $4)
        RETURNING exception_id
        "#,
    )
    .bind(recon_id)
    .bind(exception_type)
    .bind(details)
    .bind(created_by)
    .fetch_one(&mut **tx)
    .await
}

/// Refresh the classification on an already-open exception after a rerun.
pub async fn update_open_exception(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: i64,
    exception_type: &str,
    details: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exception_records SET exception_type = $2, details = $3 WHERE exception_id = $1",
    )
    .bind(exception_id)
    .bind(exception_type)
    .bind(details)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn resolve_open_exceptions(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
    resolved_by: &str,
    remarks: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE exception_records
        SET status = 'RESOLVED', remarks = $3, resolved_by = $2, resolved_date = NOW()
        WHERE recon_id = $1 AND status = 'OPEN'
        "#,
    )
    .bind(recon_id)
    .bind(resolved_by)
    .bind(remarks)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn resolve_exception(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: i64,
    resolved_by: &str,
    remarks: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE exception_records
        SET status = 'RESOLVED', remarks = $3, resolved_by = $2, resolved_date = NOW()
        WHERE exception_id = $1
        "#,
    )
    .bind(exception_id)
    .bind(resolved_by)
    .bind(remarks)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Business date behind an exception, via its linked reconciliation result.
/// Exceptions with no recon link have no date to gate on.
pub async fn exception_base_date_tx(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: i64,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<NaiveDate>>(
        r#"
        SELECT COALESCE(rr.remittance_date, rr.pickup_date)
        FROM exception_records er
        JOIN reconciliation_results rr ON rr.recon_id = er.recon_id
        WHERE er.exception_id = $1
        "#,
    )
    .bind(exception_id)
    .fetch_optional(&mut **tx)
    .await
    .map(Option::flatten)
}

pub async fn find_exception(
    pool: &PgPool,
    exception_id: i64,
) -> Result<Option<ExceptionRow>, sqlx::Error> {
    sqlx::query_as::<_, ExceptionRow>(
        r#"
        SELECT exception_id, recon_id, exception_type, status, details, remarks,
               created_by, created_date, resolved_by, resolved_date
        FROM exception_records
        WHERE exception_id = $1
        "#,
    )
    .bind(exception_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_exceptions(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<ExceptionRow>, sqlx::Error> {
    match status {
        Some(s) => {
            sqlx::query_as::<_, ExceptionRow>(
                r#"
                SELECT exception_id, recon_id, exception_type, status, details, remarks,
                       created_by, created_date, resolved_by, resolved_date
                FROM exception_records
                WHERE status = $1
                ORDER BY exception_id DESC
                "#,
            )
            .bind(s)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ExceptionRow>(
                r#"
                SELECT exception_id, recon_id, exception_type, status, details, remarks,
                       created_by, created_date, resolved_by, resolved_date
                FROM exception_records
                ORDER BY exception_id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}
