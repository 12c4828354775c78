//! Monthly charge computation.
//!
//! Vendor charges: per-pickup rates by type, with free on-call pickups per
//! the CALL pickup rule and a volume enhancement on total pickup value.
//! Customer charges: slab lookup per (customer, vendor) with a percentage
//! fallback, beat-only enhancement, and a per-customer waiver. Vendor runs
//! are one-shot per (vendor, month), customer runs per month; recomputation
//! requires an administrative cleanup.
//!
//! Configuration codes resolved as of the last day of the month:
//! ENHANCEMENT_THRESHOLD_AMOUNT, ENHANCEMENT_CHARGE_AMOUNT, GST_ENABLED,
//! GST_RATE_PERCENT, CUSTOMER_CHARGE_RATE_PERCENT.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::contracts::charges_v1::{ComputeChargesRequest, ComputeChargesResponse};
use crate::contracts::masters_v1::CustomerSlabRow;
use crate::repos::charge_repo::{CustomerSummaryInsert, VendorSummaryInsert};
use crate::repos::{audit_repo, charge_repo, config_repo, master_repo, upload_repo};
use crate::services::period::{ensure_month_open, LockError, MonthKey, MonthKeyError};

#[derive(Debug, Error)]
pub enum ChargeError {
    #[error("{0}")]
    InvalidMonthKey(#[from] MonthKeyError),

    #[error("Month {0} is locked")]
    MonthLocked(String),

    #[error("Charges already computed for {0}")]
    AlreadyComputed(String),

    #[error("Charges already computed for vendor {vendor_id} in {month_key}")]
    AlreadyComputedForVendor { vendor_id: i64, month_key: String },

    #[error("Beat charge config missing for vendor {0}")]
    MissingBeatRate(String),

    #[error("Call charge config missing for vendor {0}")]
    MissingCallRate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LockError> for ChargeError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Locked(key) => ChargeError::MonthLocked(key),
            LockError::Database(e) => ChargeError::Database(e),
        }
    }
}

// ============================================================
// Pure charge math
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRate {
    Beat,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Beat,
    Call,
}

/// Billable pickup kind of a canonical row. Rows without a recognized type
/// are billed as neither kind.
pub fn pickup_kind(pickup_type: Option<&str>) -> Option<PickupKind> {
    match pickup_type {
        Some("BEAT") => Some(PickupKind::Beat),
        Some("CALL") => Some(PickupKind::Call),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorBaseCharge {
    pub beat_charge: Decimal,
    pub chargeable_calls: i64,
    pub call_charge: Decimal,
}

/// Base charge for a vendor month. A missing rate only matters when there is
/// something to bill against it.
pub fn vendor_base_charge(
    beat_count: i64,
    call_count: i64,
    free_call_limit: i64,
    beat_rate: Option<Decimal>,
    call_rate: Option<Decimal>,
) -> Result<VendorBaseCharge, MissingRate> {
    let beat_charge = if beat_count > 0 {
        let rate = beat_rate.ok_or(MissingRate::Beat)?;
        Decimal::from(beat_count) * rate
    } else {
        Decimal::ZERO
    };

    let chargeable_calls = (call_count - free_call_limit).max(0);
    let call_charge = if chargeable_calls > 0 {
        let rate = call_rate.ok_or(MissingRate::Call)?;
        Decimal::from(chargeable_calls) * rate
    } else {
        Decimal::ZERO
    };

    Ok(VendorBaseCharge {
        beat_charge,
        chargeable_calls,
        call_charge,
    })
}

/// Volume enhancement: one unit charge per whole threshold multiple.
pub fn enhancement_charge(
    total_amount: Decimal,
    threshold: Option<Decimal>,
    per_unit: Option<Decimal>,
) -> Decimal {
    match (threshold, per_unit) {
        (Some(threshold), Some(per_unit)) if threshold > Decimal::ZERO => {
            (total_amount / threshold).floor() * per_unit
        }
        _ => Decimal::ZERO,
    }
}

/// First slab whose range contains the amount (ranges are inclusive).
pub fn slab_charge(slabs: &[CustomerSlabRow], amount: Decimal) -> Option<Decimal> {
    slabs
        .iter()
        .find(|s| s.amount_from <= amount && amount <= s.amount_to)
        .map(|s| s.charge_amount)
}

pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// Waiver against a charge. BOTH takes the smaller of the percentage amount
/// and the cap when a nonzero cap is set. The waiver never exceeds the
/// charge it applies to.
pub fn waiver_amount(
    waiver_type: &str,
    percentage: Option<Decimal>,
    cap: Option<Decimal>,
    charge: Decimal,
) -> Decimal {
    let pct_amount = percentage.map(|p| percent_of(charge, p)).unwrap_or(Decimal::ZERO);
    let raw = match waiver_type {
        "PERCENT" => pct_amount,
        "CAP" => cap.unwrap_or(Decimal::ZERO),
        "BOTH" => match cap {
            Some(c) if c > Decimal::ZERO => pct_amount.min(c),
            _ => pct_amount,
        },
        _ => Decimal::ZERO,
    };
    raw.min(charge).max(Decimal::ZERO)
}

/// GST on a charge when enabled. The enable flag is the literal text "Y".
pub fn gst_amount(charge: Decimal, enabled_flag: Option<&str>, rate_percent: Option<Decimal>) -> Decimal {
    let enabled = enabled_flag.map(|f| f.eq_ignore_ascii_case("Y")).unwrap_or(false);
    match (enabled, rate_percent) {
        (true, Some(rate)) => percent_of(charge, rate),
        _ => Decimal::ZERO,
    }
}

// ============================================================
// Orchestration
// ============================================================

#[derive(Debug, Default)]
struct VendorMonthAgg {
    beat_count: i64,
    call_count: i64,
    total_pickup: Decimal,
}

/// Compute vendor charge summaries for a month, optionally restricted to a
/// vendor subset. Fails when the month is locked, when any vendor in scope
/// already has a summary, and when a vendor has billable pickups with no
/// configured rate. Only rows typed BEAT or CALL are countable.
pub async fn compute_vendor_charges(
    pool: &PgPool,
    actor_id: &str,
    req: ComputeChargesRequest,
) -> Result<ComputeChargesResponse, ChargeError> {
    let month = MonthKey::parse(&req.month_key)?;
    ensure_month_open(pool, &month).await?;

    let as_of = month.last_day();
    let txns = upload_repo::vendor_txns_for_month(pool, month.first_day(), as_of).await?;

    let mut per_vendor: BTreeMap<i64, VendorMonthAgg> = BTreeMap::new();
    for txn in txns {
        if let Some(ids) = &req.vendor_ids {
            if !ids.contains(&txn.vendor_id) {
                continue;
            }
        }
        let agg = per_vendor.entry(txn.vendor_id).or_default();
        match pickup_kind(txn.pickup_type.as_deref()) {
            Some(PickupKind::Beat) => agg.beat_count += 1,
            Some(PickupKind::Call) => agg.call_count += 1,
            None => {}
        }
        if let Some(amount) = txn.pickup_amount {
            agg.total_pickup += amount;
        }
    }

    for vendor_id in per_vendor.keys() {
        if charge_repo::vendor_summary_exists_for(pool, *vendor_id, &req.month_key).await? {
            return Err(ChargeError::AlreadyComputedForVendor {
                vendor_id: *vendor_id,
                month_key: req.month_key.clone(),
            });
        }
    }

    let vendor_codes: BTreeMap<i64, String> = master_repo::active_vendors(pool)
        .await?
        .into_iter()
        .map(|v| (v.vendor_id, v.vendor_code))
        .collect();

    let free_call_limit = master_repo::active_pickup_rule_free_limit(pool, "CALL", as_of)
        .await?
        .unwrap_or(0);
    let threshold = config_repo::resolve_number(pool, "ENHANCEMENT_THRESHOLD_AMOUNT", as_of).await?;
    let per_unit = config_repo::resolve_number(pool, "ENHANCEMENT_CHARGE_AMOUNT", as_of).await?;
    let gst_flag = config_repo::resolve_text(pool, "GST_ENABLED", as_of).await?;
    let gst_rate = config_repo::resolve_number(pool, "GST_RATE_PERCENT", as_of).await?;

    let mut rows: Vec<VendorSummaryInsert> = Vec::with_capacity(per_vendor.len());
    for (vendor_id, agg) in &per_vendor {
        let vendor_code = vendor_codes
            .get(vendor_id)
            .cloned()
            .unwrap_or_else(|| vendor_id.to_string());

        let beat_rate = master_repo::active_vendor_charge_rate(pool, *vendor_id, "BEAT", as_of).await?;
        let call_rate = master_repo::active_vendor_charge_rate(pool, *vendor_id, "CALL", as_of).await?;

        let base = vendor_base_charge(
            agg.beat_count,
            agg.call_count,
            free_call_limit,
            beat_rate,
            call_rate,
        )
        .map_err(|missing| match missing {
            MissingRate::Beat => ChargeError::MissingBeatRate(vendor_code.clone()),
            MissingRate::Call => ChargeError::MissingCallRate(vendor_code.clone()),
        })?;

        let base_total = base.beat_charge + base.call_charge;
        let enhancement = enhancement_charge(agg.total_pickup, threshold, per_unit);
        let total = base_total + enhancement;
        let tax = gst_amount(total, gst_flag.as_deref(), gst_rate);

        rows.push(VendorSummaryInsert {
            vendor_id: *vendor_id,
            month_key: req.month_key.clone(),
            beat_pickups: agg.beat_count,
            call_pickups: agg.call_count,
            base_charge_amount: base_total,
            enhancement_charge: enhancement,
            tax_amount: tax,
            total_charge_amount: total,
            total_with_tax: total + tax,
        });
    }

    let mut tx = pool.begin().await?;
    for row in &rows {
        charge_repo::insert_vendor_summary(&mut tx, row, actor_id).await?;
    }
    audit_repo::log(
        &mut tx,
        "VENDOR_CHARGE_SUMMARY",
        None,
        "COMPUTE",
        None,
        Some(&format!(
            r#"{{"month_key":"{}","vendors":{}}}"#,
            req.month_key,
            rows.len()
        )),
        actor_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(month_key = %req.month_key, vendors = rows.len(), "vendor charges computed");

    Ok(ComputeChargesResponse {
        month_key: req.month_key,
        summaries_created: rows.len(),
    })
}

#[derive(Debug, Default)]
struct CustomerVendorAgg {
    total_amount: Decimal,
    beat_amount: Decimal,
}

#[derive(Debug, Default)]
struct CustomerAgg {
    total_amount: Decimal,
    base_charge: Decimal,
    enhancement: Decimal,
}

/// Compute customer charge summaries for a month. Slabs are looked up per
/// (customer, vendor) with the flat percentage as fallback; the waiver
/// applies once per customer on the merged charge.
pub async fn compute_customer_charges(
    pool: &PgPool,
    actor_id: &str,
    req: ComputeChargesRequest,
) -> Result<ComputeChargesResponse, ChargeError> {
    let month = MonthKey::parse(&req.month_key)?;
    ensure_month_open(pool, &month).await?;
    if charge_repo::customer_summary_exists(pool, &req.month_key).await? {
        return Err(ChargeError::AlreadyComputed(req.month_key));
    }

    let as_of = month.last_day();
    let txns = upload_repo::vendor_txns_for_month(pool, month.first_day(), as_of).await?;

    // Group amounts per (customer, vendor). Rows without a customer id fall
    // back to the identity on the store mapping; rows still unresolved are
    // not billable and are skipped.
    let mut groups: BTreeMap<(String, i64), CustomerVendorAgg> = BTreeMap::new();
    for txn in txns {
        let amount = match txn.remittance_amount.or(txn.pickup_amount) {
            Some(a) => a,
            None => continue,
        };
        let customer_id = match &txn.customer_id {
            Some(id) => Some(id.clone()),
            None => match (&txn.vendor_store_code, txn.remittance_date.or(txn.pickup_date)) {
                (Some(code), Some(as_of_row)) => {
                    master_repo::mapping_customer_id(
                        pool,
                        txn.vendor_id,
                        code,
                        &txn.bank_store_code,
                        as_of_row,
                    )
                    .await?
                }
                _ => None,
            },
        };
        let Some(customer_id) = customer_id else {
            continue;
        };
        let agg = groups.entry((customer_id, txn.vendor_id)).or_default();
        agg.total_amount += amount;
        if pickup_kind(txn.pickup_type.as_deref()) == Some(PickupKind::Beat) {
            agg.beat_amount += amount;
        }
    }

    let threshold = config_repo::resolve_number(pool, "ENHANCEMENT_THRESHOLD_AMOUNT", as_of).await?;
    let per_unit = config_repo::resolve_number(pool, "ENHANCEMENT_CHARGE_AMOUNT", as_of).await?;
    let fallback_rate =
        config_repo::resolve_number(pool, "CUSTOMER_CHARGE_RATE_PERCENT", as_of).await?;
    let gst_flag = config_repo::resolve_text(pool, "GST_ENABLED", as_of).await?;
    let gst_rate = config_repo::resolve_number(pool, "GST_RATE_PERCENT", as_of).await?;

    let mut slab_cache: BTreeMap<i64, Vec<CustomerSlabRow>> = BTreeMap::new();
    let mut per_customer: BTreeMap<String, CustomerAgg> = BTreeMap::new();

    for ((customer_id, vendor_id), agg) in &groups {
        if !slab_cache.contains_key(vendor_id) {
            let slabs = master_repo::active_slabs(pool, *vendor_id, as_of).await?;
            slab_cache.insert(*vendor_id, slabs);
        }
        let slabs = &slab_cache[vendor_id];

        let base = match slab_charge(slabs, agg.total_amount) {
            Some(charge) => charge,
            None => fallback_rate
                .map(|rate| percent_of(agg.total_amount, rate))
                .unwrap_or(Decimal::ZERO),
        };
        let enhancement = enhancement_charge(agg.beat_amount, threshold, per_unit);

        let entry = per_customer.entry(customer_id.clone()).or_default();
        entry.total_amount += agg.total_amount;
        entry.base_charge += base;
        entry.enhancement += enhancement;
    }

    let mut rows: Vec<CustomerSummaryInsert> = Vec::with_capacity(per_customer.len());
    for (customer_id, agg) in &per_customer {
        let gross = agg.base_charge + agg.enhancement;
        let waiver = match master_repo::active_waiver(pool, customer_id, as_of).await? {
            Some(w) => waiver_amount(&w.waiver_type, w.waiver_percentage, w.waiver_cap_amount, gross),
            None => Decimal::ZERO,
        };
        let net = (gross - waiver).max(Decimal::ZERO);
        let tax = gst_amount(net, gst_flag.as_deref(), gst_rate);

        rows.push(CustomerSummaryInsert {
            customer_id: customer_id.clone(),
            month_key: req.month_key.clone(),
            total_remittance: agg.total_amount,
            base_charge_amount: agg.base_charge,
            enhancement_charge: agg.enhancement,
            waiver_amount: waiver,
            net_charge_amount: net,
            tax_amount: tax,
            total_with_tax: net + tax,
        });
    }

    let mut tx = pool.begin().await?;
    for row in &rows {
        charge_repo::insert_customer_summary(&mut tx, row, actor_id).await?;
    }
    audit_repo::log(
        &mut tx,
        "CUSTOMER_CHARGE_SUMMARY",
        None,
        "COMPUTE",
        None,
        Some(&format!(
            r#"{{"month_key":"{}","customers":{}}}"#,
            req.month_key,
            rows.len()
        )),
        actor_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(month_key = %req.month_key, customers = rows.len(), "customer charges computed");

    Ok(ComputeChargesResponse {
        month_key: req.month_key,
        summaries_created: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn slab(from: &str, to: &str, charge: &str) -> CustomerSlabRow {
        CustomerSlabRow {
            slab_id: 0,
            vendor_id: 1,
            amount_from: dec(from),
            amount_to: dec(to),
            charge_amount: dec(charge),
            slab_label: None,
            status: "ACTIVE".into(),
            effective_from: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            effective_to: None,
        }
    }

    #[test]
    fn untyped_pickups_are_billed_as_neither_kind() {
        assert_eq!(pickup_kind(Some("BEAT")), Some(PickupKind::Beat));
        assert_eq!(pickup_kind(Some("CALL")), Some(PickupKind::Call));
        assert_eq!(pickup_kind(None), None);
        assert_eq!(pickup_kind(Some("OTHER")), None);
    }

    #[test]
    fn free_call_limit_reduces_chargeable_calls() {
        let base = vendor_base_charge(0, 12, 10, None, Some(dec("5"))).unwrap();
        assert_eq!(base.chargeable_calls, 2);
        assert_eq!(base.call_charge, dec("10"));
    }

    #[test]
    fn calls_within_free_limit_need_no_rate() {
        let base = vendor_base_charge(3, 8, 10, Some(dec("20")), None).unwrap();
        assert_eq!(base.chargeable_calls, 0);
        assert_eq!(base.call_charge, Decimal::ZERO);
        assert_eq!(base.beat_charge, dec("60"));
    }

    #[test]
    fn missing_rate_with_billable_pickups_fails() {
        assert_eq!(
            vendor_base_charge(5, 0, 0, None, None),
            Err(MissingRate::Beat)
        );
        assert_eq!(
            vendor_base_charge(0, 11, 10, None, None),
            Err(MissingRate::Call)
        );
    }

    #[test]
    fn enhancement_uses_whole_multiples_only() {
        assert_eq!(
            enhancement_charge(dec("250000"), Some(dec("100000")), Some(dec("50"))),
            dec("100")
        );
        assert_eq!(
            enhancement_charge(dec("99999.99"), Some(dec("100000")), Some(dec("50"))),
            Decimal::ZERO
        );
        assert_eq!(enhancement_charge(dec("250000"), None, Some(dec("50"))), Decimal::ZERO);
        assert_eq!(
            enhancement_charge(dec("250000"), Some(Decimal::ZERO), Some(dec("50"))),
            Decimal::ZERO
        );
    }

    #[test]
    fn slab_ranges_are_inclusive() {
        let slabs = vec![slab("0", "1000", "10"), slab("1000.01", "5000", "25")];
        assert_eq!(slab_charge(&slabs, dec("1000")), Some(dec("10")));
        assert_eq!(slab_charge(&slabs, dec("1000.01")), Some(dec("25")));
        assert_eq!(slab_charge(&slabs, dec("9999")), None);
    }

    #[test]
    fn waiver_both_takes_smaller_of_percent_and_cap() {
        // 10% of 1000 = 100, capped at 50
        assert_eq!(
            waiver_amount("BOTH", Some(dec("10")), Some(dec("50")), dec("1000")),
            dec("50")
        );
        // Zero cap means the percentage stands alone
        assert_eq!(
            waiver_amount("BOTH", Some(dec("10")), Some(Decimal::ZERO), dec("1000")),
            dec("100")
        );
    }

    #[test]
    fn waiver_never_exceeds_the_charge() {
        assert_eq!(
            waiver_amount("CAP", None, Some(dec("500")), dec("120")),
            dec("120")
        );
    }

    #[test]
    fn gst_requires_the_literal_enable_flag() {
        assert_eq!(gst_amount(dec("200"), Some("Y"), Some(dec("18"))), dec("36"));
        assert_eq!(gst_amount(dec("200"), Some("y"), Some(dec("18"))), dec("36"));
        assert_eq!(gst_amount(dec("200"), Some("N"), Some(dec("18"))), Decimal::ZERO);
        assert_eq!(gst_amount(dec("200"), None, Some(dec("18"))), Decimal::ZERO);
    }
}
