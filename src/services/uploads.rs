//! Upload ingestion orchestration.
//!
//! One transaction per upload: the batch header, verbatim raw rows,
//! quarantined rows and canonical transactions all land together or not at
//! all. A vendor file containing any store code with no mapping covering the
//! row's pickup date fails as a whole batch with zero canonical rows; the
//! offending rows are quarantined so the failure is explainable afterwards.

use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::contracts::uploads_v1::{
    LedgerUploadRequest, LedgerUploadResponse, VendorUploadRequest, VendorUploadResponse,
    VendorValidateRequest, VendorValidateResponse,
};
use crate::repos::master_repo::{self, MappingLookup};
use crate::repos::upload_repo::CanonicalInsert;
use crate::repos::{audit_repo, upload_repo};
use crate::services::canonical::{
    classify_ledger_row, classify_vendor_row, LedgerRowData, VendorFormatMapping,
};
use crate::services::period::{ensure_month_open, LockError, MonthKey};

pub const UNMAPPED_REASON: &str = "Vendor store code not mapped";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("A ledger batch already exists for {0}")]
    DuplicateLedgerBatch(chrono::NaiveDate),

    #[error("A vendor batch already exists for vendor {vendor_code} on {mis_date}")]
    DuplicateVendorBatch {
        vendor_code: String,
        mis_date: chrono::NaiveDate,
    },

    #[error("Unknown or inactive vendor: {0}")]
    UnknownVendor(String),

    #[error("No active file format configured for vendor {0}")]
    NoFileFormat(String),

    #[error("Vendor file format mapping is invalid: {0}")]
    InvalidFormat(String),

    #[error("Month {0} is locked")]
    MonthLocked(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LockError> for UploadError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Locked(key) => UploadError::MonthLocked(key),
            LockError::Database(e) => UploadError::Database(e),
        }
    }
}

/// Final batch status: a batch that produced no canonical rows failed, even
/// when every row was merely invalid.
pub fn batch_status(canonical_rows: usize) -> &'static str {
    if canonical_rows > 0 {
        "PROCESSED"
    } else {
        "FAILED"
    }
}

/// Canonical shape of a ledger row. The ledger reports money already
/// remitted, so the pickup side mirrors the remittance side.
pub fn ledger_canonical(data: LedgerRowData, batch_id: i64) -> CanonicalInsert {
    CanonicalInsert {
        source: "FINACLE",
        bank_store_code: data.store_code,
        vendor_store_code: None,
        account_no: Some(data.foracid),
        customer_id: Some(data.cust_id),
        pickup_date: Some(data.tran_date),
        remittance_date: Some(data.tran_date),
        pickup_amount: Some(data.colln_amt),
        remittance_amount: Some(data.colln_amt),
        pickup_type: None,
        raw_batch_id: batch_id,
    }
}

/// Dry-run verdict. An interval gap outranks a missing mapping because it
/// usually means a master needs extending rather than creating.
pub fn validate_status(unmapped: &[String], out_of_range: &[String]) -> &'static str {
    if !out_of_range.is_empty() {
        "OUT_OF_RANGE"
    } else if !unmapped.is_empty() {
        "UNMAPPED"
    } else {
        "OK"
    }
}

/// Ingest a core-banking ledger extract. Exactly one batch may ever exist
/// per MIS date.
pub async fn ingest_ledger(
    pool: &PgPool,
    uploaded_by: &str,
    req: LedgerUploadRequest,
) -> Result<LedgerUploadResponse, UploadError> {
    ensure_month_open(pool, &MonthKey::from_date(req.mis_date)).await?;

    if upload_repo::find_ledger_batch(pool, req.mis_date).await?.is_some() {
        return Err(UploadError::DuplicateLedgerBatch(req.mis_date));
    }

    let mut tx = pool.begin().await?;
    let batch_id =
        upload_repo::insert_ledger_batch(&mut tx, req.mis_date, &req.file_name, uploaded_by)
            .await?;

    let mut canonical_rows = 0usize;
    let mut quarantined_rows = 0usize;

    for (idx, row) in req.rows.iter().enumerate() {
        let row_number = (idx + 1) as i64;
        let payload = row.to_string();
        upload_repo::insert_ledger_raw(&mut tx, batch_id, row_number, &payload).await?;

        match classify_ledger_row(row) {
            Ok(data) => {
                let canonical_id =
                    upload_repo::insert_canonical(&mut tx, &ledger_canonical(data, batch_id))
                        .await?;
                upload_repo::insert_remittance_entry(&mut tx, canonical_id, "FINACLE", uploaded_by)
                    .await?;
                canonical_rows += 1;
            }
            Err(reason) => {
                upload_repo::insert_ledger_invalid(&mut tx, batch_id, row_number, reason, &payload)
                    .await?;
                quarantined_rows += 1;
            }
        }
    }

    let status = batch_status(canonical_rows);
    upload_repo::update_ledger_batch_status(&mut tx, batch_id, status).await?;
    audit_repo::log(
        &mut tx,
        "LEDGER_BATCH",
        Some(batch_id),
        "UPLOAD",
        None,
        Some(&format!(
            r#"{{"mis_date":"{}","canonical":{},"quarantined":{}}}"#,
            req.mis_date, canonical_rows, quarantined_rows
        )),
        uploaded_by,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(batch_id, mis_date = %req.mis_date, status, canonical_rows, quarantined_rows, "ledger batch ingested");

    Ok(LedgerUploadResponse {
        batch_id,
        mis_date: req.mis_date,
        status: status.to_string(),
        total_rows: req.rows.len(),
        canonical_rows,
        quarantined_rows,
    })
}

fn parse_mapping(json: &str) -> Result<VendorFormatMapping, UploadError> {
    serde_json::from_str(json).map_err(|e| UploadError::InvalidFormat(e.to_string()))
}

/// Ingest a vendor pickup file. A failed batch for the same slot is purged
/// and the slot reused; any other existing batch is a conflict.
pub async fn ingest_vendor(
    pool: &PgPool,
    uploaded_by: &str,
    req: VendorUploadRequest,
) -> Result<VendorUploadResponse, UploadError> {
    ensure_month_open(pool, &MonthKey::from_date(req.mis_date)).await?;

    let vendor = master_repo::active_vendor_by_code(pool, &req.vendor_code)
        .await?
        .ok_or_else(|| UploadError::UnknownVendor(req.vendor_code.clone()))?;

    let stale_batch = match upload_repo::find_vendor_batch(pool, vendor.vendor_id, req.mis_date).await? {
        Some(existing) if existing.status != "FAILED" => {
            return Err(UploadError::DuplicateVendorBatch {
                vendor_code: req.vendor_code,
                mis_date: req.mis_date,
            });
        }
        Some(failed) => Some(failed.batch_id),
        None => None,
    };

    let format_json = master_repo::active_file_format(pool, vendor.vendor_id, req.mis_date)
        .await?
        .ok_or_else(|| UploadError::NoFileFormat(req.vendor_code.clone()))?;
    let mapping = parse_mapping(&format_json)?;

    // Classify up front so mapping resolution can run against the pool.
    let mut classified = Vec::with_capacity(req.rows.len());
    for row in &req.rows {
        classified.push(classify_vendor_row(row, &mapping));
    }

    // Each row resolves through the mapping covering its own pickup date; a
    // mapping version valid on the MIS date may not cover every row.
    let mut resolved: HashMap<(String, NaiveDate), Option<MappingLookup>> = HashMap::new();
    let mut unmapped: BTreeSet<String> = BTreeSet::new();
    for data in classified.iter().flatten() {
        let key = (data.vendor_store_code.clone(), data.pickup_date);
        if resolved.contains_key(&key) {
            continue;
        }
        let lookup = master_repo::find_mapping(
            pool,
            vendor.vendor_id,
            &data.vendor_store_code,
            data.pickup_date,
        )
        .await?;
        if lookup.is_none() {
            unmapped.insert(data.vendor_store_code.clone());
        }
        resolved.insert(key, lookup);
    }
    let batch_failed = !unmapped.is_empty();

    let mut tx = pool.begin().await?;
    if let Some(batch_id) = stale_batch {
        upload_repo::purge_vendor_batch(&mut tx, batch_id).await?;
    }
    let batch_id = upload_repo::insert_vendor_batch(
        &mut tx,
        vendor.vendor_id,
        req.mis_date,
        &req.file_name,
        uploaded_by,
    )
    .await?;

    let mut canonical_rows = 0usize;
    let mut quarantined_rows = 0usize;

    for (idx, (row, outcome)) in req.rows.iter().zip(classified.iter()).enumerate() {
        let row_number = (idx + 1) as i64;
        let payload = row.to_string();
        upload_repo::insert_vendor_raw(&mut tx, batch_id, row_number, &payload).await?;

        match outcome {
            Ok(data) => {
                let lookup = resolved
                    .get(&(data.vendor_store_code.clone(), data.pickup_date))
                    .and_then(|m| m.as_ref());
                match lookup {
                    None => {
                        upload_repo::insert_vendor_invalid(
                            &mut tx,
                            batch_id,
                            row_number,
                            UNMAPPED_REASON,
                            &payload,
                        )
                        .await?;
                        quarantined_rows += 1;
                    }
                    Some(lookup) if !batch_failed => {
                        let customer_id = data.customer_id.clone().or(lookup.customer_id.clone());
                        let canonical_id = upload_repo::insert_canonical(
                            &mut tx,
                            &CanonicalInsert {
                                source: "VENDOR",
                                bank_store_code: lookup.bank_store_code.clone(),
                                vendor_store_code: Some(data.vendor_store_code.clone()),
                                account_no: data.account_no.clone(),
                                customer_id,
                                pickup_date: Some(data.pickup_date),
                                remittance_date: data.remittance_date,
                                pickup_amount: Some(data.pickup_amount),
                                remittance_amount: data.remittance_amount,
                                pickup_type: data.pickup_type.clone(),
                                raw_batch_id: batch_id,
                            },
                        )
                        .await?;
                        upload_repo::insert_remittance_entry(
                            &mut tx,
                            canonical_id,
                            "VENDOR",
                            uploaded_by,
                        )
                        .await?;
                        canonical_rows += 1;
                    }
                    Some(_) => {
                        // Mapped rows of a failed batch are withheld; the raw
                        // copies remain for inspection.
                    }
                }
            }
            Err(reason) => {
                upload_repo::insert_vendor_invalid(&mut tx, batch_id, row_number, reason, &payload)
                    .await?;
                quarantined_rows += 1;
            }
        }
    }

    let status = if batch_failed {
        "FAILED"
    } else {
        batch_status(canonical_rows)
    };
    upload_repo::update_vendor_batch_status(&mut tx, batch_id, status).await?;
    audit_repo::log(
        &mut tx,
        "VENDOR_BATCH",
        Some(batch_id),
        "UPLOAD",
        None,
        Some(&format!(
            r#"{{"vendor_code":"{}","mis_date":"{}","status":"{}"}}"#,
            req.vendor_code, req.mis_date, status
        )),
        uploaded_by,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        batch_id,
        vendor_code = %req.vendor_code,
        mis_date = %req.mis_date,
        status,
        canonical_rows,
        quarantined_rows,
        "vendor batch ingested"
    );

    Ok(VendorUploadResponse {
        batch_id,
        vendor_id: vendor.vendor_id,
        mis_date: req.mis_date,
        status: status.to_string(),
        total_rows: req.rows.len(),
        canonical_rows,
        quarantined_rows,
        unmapped_store_codes: unmapped.into_iter().collect(),
    })
}

/// Dry-run mapping validation for a vendor file. Distinguishes codes that
/// were never mapped from codes whose mapping does not cover the row's
/// pickup date.
pub async fn validate_vendor(
    pool: &PgPool,
    req: VendorValidateRequest,
) -> Result<VendorValidateResponse, UploadError> {
    let vendor = master_repo::active_vendor_by_code(pool, &req.vendor_code)
        .await?
        .ok_or_else(|| UploadError::UnknownVendor(req.vendor_code.clone()))?;

    let format_json = master_repo::active_file_format(pool, vendor.vendor_id, req.mis_date)
        .await?
        .ok_or_else(|| UploadError::NoFileFormat(req.vendor_code.clone()))?;
    let mapping = parse_mapping(&format_json)?;

    let mut checked: HashMap<(String, NaiveDate), bool> = HashMap::new();
    let mut invalid_rows = 0usize;
    let mut unmapped_codes: BTreeSet<String> = BTreeSet::new();
    let mut out_of_range_codes: BTreeSet<String> = BTreeSet::new();

    for row in &req.rows {
        let Ok(data) = classify_vendor_row(row, &mapping) else {
            invalid_rows += 1;
            continue;
        };
        let key = (data.vendor_store_code.clone(), data.pickup_date);
        let in_range = match checked.get(&key) {
            Some(known) => *known,
            None => {
                let found = master_repo::find_mapping(
                    pool,
                    vendor.vendor_id,
                    &data.vendor_store_code,
                    data.pickup_date,
                )
                .await?
                .is_some();
                checked.insert(key, found);
                found
            }
        };
        if in_range {
            continue;
        }
        if master_repo::mapping_exists_any(pool, vendor.vendor_id, &data.vendor_store_code).await? {
            out_of_range_codes.insert(data.vendor_store_code);
        } else {
            unmapped_codes.insert(data.vendor_store_code);
        }
    }

    let unmapped_codes: Vec<String> = unmapped_codes.into_iter().collect();
    let out_of_range_codes: Vec<String> = out_of_range_codes.into_iter().collect();
    let status = validate_status(&unmapped_codes, &out_of_range_codes);

    Ok(VendorValidateResponse {
        status: status.to_string(),
        total_rows: req.rows.len(),
        invalid_rows,
        unmapped_codes,
        out_of_range_codes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn batch_with_no_canonical_rows_fails() {
        assert_eq!(batch_status(0), "FAILED");
        assert_eq!(batch_status(1), "PROCESSED");
    }

    #[test]
    fn ledger_canonical_mirrors_remittance_on_pickup_side() {
        let data = LedgerRowData {
            sol_id: "1001".into(),
            foracid: "AC1".into(),
            acct_name: "Shop A".into(),
            cust_id: "C1".into(),
            store_code: "S001".into(),
            location: "Pune".into(),
            colln_amt: Decimal::from_str("2500.00").unwrap(),
            tran_date: chrono::NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            tran_id: "T1".into(),
            tran_type: "CR".into(),
        };
        let insert = ledger_canonical(data, 7);
        assert_eq!(insert.pickup_date, insert.remittance_date);
        assert_eq!(insert.pickup_amount, insert.remittance_amount);
        assert_eq!(insert.pickup_amount, Decimal::from_str("2500.00").ok());
        assert_eq!(insert.pickup_type, None);
    }

    #[test]
    fn out_of_range_outranks_unmapped() {
        let unmapped = vec!["A".to_string()];
        let out_of_range = vec!["B".to_string()];
        assert_eq!(validate_status(&unmapped, &out_of_range), "OUT_OF_RANGE");
        assert_eq!(validate_status(&unmapped, &[]), "UNMAPPED");
        assert_eq!(validate_status(&[], &[]), "OK");
    }
}
