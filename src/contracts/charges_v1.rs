//! Monthly Charge Computation V1 Contract Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================
// Compute: POST /api/charges/vendor/compute, /api/charges/customer/compute
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeChargesRequest {
    /// Billing month as YYYYMM
    pub month_key: String,

    /// Restrict the vendor run to these vendors; absent means all
    #[serde(default)]
    pub vendor_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeChargesResponse {
    pub month_key: String,
    pub summaries_created: usize,
}

// ============================================================
// Summary listings
// ============================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VendorChargeSummaryRow {
    pub summary_id: i64,
    pub vendor_id: i64,
    pub month_key: String,
    pub beat_pickups: i64,
    pub call_pickups: i64,
    pub base_charge_amount: Decimal,
    pub enhancement_charge: Decimal,
    pub tax_amount: Decimal,
    pub total_charge_amount: Decimal,
    pub total_with_tax: Decimal,
    pub status: String,
    pub computed_by: String,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerChargeSummaryRow {
    pub summary_id: i64,
    pub customer_id: String,
    pub month_key: String,
    pub total_remittance: Decimal,
    pub base_charge_amount: Decimal,
    pub enhancement_charge: Decimal,
    pub waiver_amount: Decimal,
    pub net_charge_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_with_tax: Decimal,
    pub status: String,
    pub computed_by: String,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_request_accepts_month_only_payloads() {
        let req: ComputeChargesRequest =
            serde_json::from_str(r#"{"month_key":"202502"}"#).unwrap();
        assert_eq!(req.month_key, "202502");
        assert_eq!(req.vendor_ids, None);

        let req: ComputeChargesRequest =
            serde_json::from_str(r#"{"month_key":"202502","vendor_ids":[3,7]}"#).unwrap();
        assert_eq!(req.vendor_ids, Some(vec![3, 7]));
    }
}
