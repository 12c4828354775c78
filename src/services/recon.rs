//! Daily reconciliation.
//!
//! The run takes an MIS date, requires that date's ledger batch to exist,
//! and compares both sides per (bank store, transaction date): vendor
//! pickups keyed by their pickup date against ledger remittances keyed by
//! their remittance date. A batch may carry transactions dated across
//! several days, so one run can settle more than one business date per
//! store. Amounts compare exactly; there is no tolerance. Reruns update the
//! existing result row for a pair, raise or refresh an OPEN exception for
//! non-matches, and auto-resolve open exceptions once a pair matches.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::contracts::recon_v1::{ReconResultRow, ReconRunRequest, ReconRunResponse};
use crate::repos::{audit_repo, master_repo, recon_repo, upload_repo};
use crate::services::period::{ensure_month_open, LockError, MonthKey};

pub const MATCHED: &str = "MATCHED";
pub const AMOUNT_MISMATCH: &str = "AMOUNT_MISMATCH";
pub const MISSING_FINACLE: &str = "MISSING_FINACLE";
pub const MISSING_VENDOR: &str = "MISSING_VENDOR";

const RERUN_RESOLVE_REMARK: &str = "Auto-resolved after reconciliation rerun";

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("Ledger extract not uploaded for {0}")]
    LedgerNotUploaded(NaiveDate),

    #[error("Month {0} is locked")]
    MonthLocked(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LockError> for ReconError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Locked(key) => ReconError::MonthLocked(key),
            LockError::Database(e) => ReconError::Database(e),
        }
    }
}

/// Classify one (store, date) pair from its two aggregate amounts.
pub fn classify(
    vendor_total: Option<Decimal>,
    ledger_total: Option<Decimal>,
) -> (&'static str, Option<&'static str>) {
    match (vendor_total, ledger_total) {
        (None, Some(_)) => (MISSING_VENDOR, Some("No vendor pickup found")),
        (Some(_), None) => (MISSING_FINACLE, Some("No ledger remittance found")),
        (Some(v), Some(l)) if v == l => (MATCHED, None),
        (Some(_), Some(_)) => (AMOUNT_MISMATCH, Some("Amount mismatch")),
        (None, None) => (MATCHED, None),
    }
}

/// Sum amounts into (store, transaction date) buckets. Rows without a usable
/// date or amount are skipped.
pub fn bucket_totals<I>(rows: I) -> BTreeMap<(String, NaiveDate), Decimal>
where
    I: IntoIterator<Item = (String, Option<NaiveDate>, Option<Decimal>)>,
{
    let mut totals: BTreeMap<(String, NaiveDate), Decimal> = BTreeMap::new();
    for (store, date, amount) in rows {
        let (Some(date), Some(amount)) = (date, amount) else {
            continue;
        };
        *totals.entry((store, date)).or_default() += amount;
    }
    totals
}

/// Run reconciliation for one MIS date.
pub async fn run(
    pool: &PgPool,
    actor_id: &str,
    req: ReconRunRequest,
) -> Result<ReconRunResponse, ReconError> {
    let date = req.recon_date;
    ensure_month_open(pool, &MonthKey::from_date(date)).await?;

    let ledger_batch = upload_repo::find_ledger_batch(pool, date)
        .await?
        .ok_or(ReconError::LedgerNotUploaded(date))?;

    // Ledger side: remittance totals per (store, remittance date), from the
    // batch ingested for this MIS date.
    let ledger_rows = upload_repo::ledger_txns_for_batch(pool, ledger_batch.batch_id).await?;
    let ledger_totals = bucket_totals(ledger_rows.into_iter().map(|txn| {
        (
            txn.bank_store_code,
            txn.remittance_date.or(txn.pickup_date),
            txn.remittance_amount,
        )
    }));

    // Vendor side: pickup totals per (store, pickup date) across every
    // vendor batch uploaded for this MIS date. Each row resolves through the
    // mapping active on its own pickup date; unresolvable codes are skipped.
    let mut vendor_rows: Vec<(String, Option<NaiveDate>, Option<Decimal>)> = Vec::new();
    let mut skipped_unmapped: BTreeSet<String> = BTreeSet::new();
    for txn in upload_repo::vendor_txns_for_mis_date(pool, date).await? {
        let store = match &txn.vendor_store_code {
            Some(code) => {
                let as_of = txn.pickup_date.unwrap_or(date);
                match master_repo::find_mapping(pool, txn.vendor_id, code, as_of).await? {
                    Some(lookup) => lookup.bank_store_code,
                    None => {
                        skipped_unmapped.insert(code.clone());
                        continue;
                    }
                }
            }
            None => txn.bank_store_code.clone(),
        };
        vendor_rows.push((store, txn.pickup_date, txn.pickup_amount));
    }
    let vendor_totals = bucket_totals(vendor_rows);

    let pairs: BTreeSet<(String, NaiveDate)> = ledger_totals
        .keys()
        .chain(vendor_totals.keys())
        .cloned()
        .collect();

    let mut matched = 0usize;
    let mut mismatched = 0usize;
    let mut missing_vendor = 0usize;
    let mut missing_finacle = 0usize;

    let mut tx = pool.begin().await?;
    for pair in &pairs {
        let (store, txn_date) = pair;
        let vendor_total = vendor_totals.get(pair).copied();
        let ledger_total = ledger_totals.get(pair).copied();
        let (status, reason) = classify(vendor_total, ledger_total);

        match status {
            MATCHED => matched += 1,
            AMOUNT_MISMATCH => mismatched += 1,
            MISSING_VENDOR => missing_vendor += 1,
            MISSING_FINACLE => missing_finacle += 1,
            _ => {}
        }

        let recon_id = match recon_repo::find_result_for(&mut tx, store, *txn_date).await? {
            Some(existing) => {
                recon_repo::update_result(
                    &mut tx,
                    existing.recon_id,
                    Some(*txn_date),
                    Some(*txn_date),
                    vendor_total,
                    ledger_total,
                    status,
                    reason,
                )
                .await?;
                existing.recon_id
            }
            None => {
                recon_repo::insert_result(
                    &mut tx,
                    store,
                    Some(*txn_date),
                    Some(*txn_date),
                    vendor_total,
                    ledger_total,
                    status,
                    reason,
                )
                .await?
            }
        };

        if status == MATCHED {
            recon_repo::resolve_open_exceptions(&mut tx, recon_id, actor_id, RERUN_RESOLVE_REMARK)
                .await?;
        } else {
            match recon_repo::find_open_exception(&mut tx, recon_id).await? {
                Some(exception_id) => {
                    recon_repo::update_open_exception(&mut tx, exception_id, status, reason)
                        .await?;
                }
                None => {
                    recon_repo::insert_exception(&mut tx, Some(recon_id), status, reason, actor_id)
                        .await?;
                }
            }
        }
    }

    audit_repo::log(
        &mut tx,
        "RECONCILIATION",
        None,
        "RUN",
        None,
        Some(&format!(
            r#"{{"recon_date":"{date}","total":{},"matched":{matched}}}"#,
            pairs.len()
        )),
        actor_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(%date, total = pairs.len(), matched, mismatched, missing_vendor, missing_finacle, "reconciliation run complete");

    Ok(ReconRunResponse {
        recon_date: date,
        total: pairs.len(),
        matched,
        mismatched,
        missing_vendor,
        missing_finacle,
        skipped_unmapped: skipped_unmapped.into_iter().collect(),
    })
}

pub async fn list_results(
    pool: &PgPool,
    date: Option<NaiveDate>,
) -> Result<Vec<ReconResultRow>, sqlx::Error> {
    recon_repo::list_results(pool, date).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    #[test]
    fn equal_amounts_match_exactly() {
        assert_eq!(classify(Some(dec("100.00")), Some(dec("100.00"))), (MATCHED, None));
        // Trailing zeros do not break Decimal equality
        assert_eq!(classify(Some(dec("100")), Some(dec("100.00"))), (MATCHED, None));
    }

    #[test]
    fn one_paisa_difference_is_a_mismatch() {
        let (status, reason) = classify(Some(dec("100.00")), Some(dec("100.01")));
        assert_eq!(status, AMOUNT_MISMATCH);
        assert_eq!(reason, Some("Amount mismatch"));
    }

    #[test]
    fn absent_sides_classify_as_missing() {
        assert_eq!(classify(None, Some(dec("50"))).0, MISSING_VENDOR);
        assert_eq!(classify(Some(dec("50")), None).0, MISSING_FINACLE);
    }

    #[test]
    fn totals_keep_same_store_on_different_days_apart() {
        let totals = bucket_totals(vec![
            ("S001".to_string(), Some(d("2025-02-10")), Some(dec("100"))),
            ("S001".to_string(), Some(d("2025-02-10")), Some(dec("50"))),
            ("S001".to_string(), Some(d("2025-02-11")), Some(dec("70"))),
            ("S002".to_string(), Some(d("2025-02-10")), Some(dec("30"))),
        ]);
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[&("S001".to_string(), d("2025-02-10"))], dec("150"));
        assert_eq!(totals[&("S001".to_string(), d("2025-02-11"))], dec("70"));
        assert_eq!(totals[&("S002".to_string(), d("2025-02-10"))], dec("30"));
    }

    #[test]
    fn totals_skip_rows_without_date_or_amount() {
        let totals = bucket_totals(vec![
            ("S001".to_string(), None, Some(dec("100"))),
            ("S001".to_string(), Some(d("2025-02-10")), None),
        ]);
        assert!(totals.is_empty());
    }
}
