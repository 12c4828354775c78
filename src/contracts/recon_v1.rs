//! Reconciliation V1 Contract Types
//!
//! Reconciliation compares vendor pickups against ledger remittances per
//! (bank store, date) and records one result row per pair. Non-matched
//! results raise exceptions; corrections flow through maker-checker.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================
// Run: POST /api/reconciliation/run
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconRunRequest {
    /// Business date to reconcile
    pub recon_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconRunResponse {
    pub recon_date: NaiveDate,
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub missing_vendor: usize,
    pub missing_finacle: usize,
    /// Vendor store codes skipped because no mapping resolved them
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped_unmapped: Vec<String>,
}

// ============================================================
// Results listing
// ============================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReconResultRow {
    pub recon_id: i64,
    pub bank_store_code: String,
    pub pickup_date: Option<NaiveDate>,
    pub remittance_date: Option<NaiveDate>,
    pub pickup_amount: Option<Decimal>,
    pub remittance_amount: Option<Decimal>,
    pub status: String,
    pub reason: Option<String>,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExceptionRow {
    pub exception_id: i64,
    pub recon_id: Option<i64>,
    pub exception_type: String,
    pub status: String,
    pub details: Option<String>,
    pub remarks: Option<String>,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub resolved_by: Option<String>,
    pub resolved_date: Option<DateTime<Utc>>,
}

// ============================================================
// Corrections: POST /api/reconciliation/{recon_id}/corrections
// ============================================================

/// Maker-proposed amount edit on a reconciliation result. Takes effect only
/// after checker approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub correction_type: String,
    pub pickup_amount: Option<Decimal>,
    pub remittance_amount: Option<Decimal>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResponse {
    pub correction_id: i64,
    pub approval_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CorrectionRow {
    pub correction_id: i64,
    pub recon_id: i64,
    pub approval_id: i64,
    pub proposed_data: String,
    pub status: String,
    pub maker_id: String,
    pub checker_id: Option<String>,
    pub created_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
}

// ============================================================
// Exception resolution request: POST /api/exceptions/{id}/resolve-request
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionResolveRequest {
    pub remarks: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionCreateRequest {
    pub recon_id: Option<i64>,
    pub exception_type: String,
    pub details: Option<String>,
}

// ============================================================
// Remittance lifecycle
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemittanceActionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RemittanceRow {
    pub remittance_id: i64,
    pub canonical_id: i64,
    pub source: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
}
