//! Master Data V1 Contract Types
//!
//! Masters are versioned: requests create INACTIVE candidate rows plus a
//! PENDING approval. Activation (and sibling close-out) happens when the
//! checker approves. List endpoints expose active rows only unless asked.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================
// Requests (maker side)
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorMasterRequest {
    pub vendor_code: String,
    pub vendor_name: String,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStoreRequest {
    pub bank_store_code: String,
    pub store_name: Option<String>,
    pub sol_id: Option<String>,
    pub location: Option<String>,
    pub frequency: Option<String>,
    pub daily_pickup_limit: Option<Decimal>,
    pub deposition_branch: Option<String>,
    pub deposition_branch_name: Option<String>,
    pub fixed_charge: Option<Decimal>,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMappingRequest {
    pub vendor_id: i64,
    pub vendor_store_code: String,
    pub bank_store_code: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub account_no: Option<String>,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeConfigRequest {
    pub config_code: String,
    pub config_name: String,
    pub value_number: Option<Decimal>,
    pub value_text: Option<String>,
    pub value_date: Option<NaiveDate>,
    pub unit_of_measure: Option<String>,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupRuleRequest {
    pub pickup_type: String,
    pub free_limit: Option<i64>,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorChargeRequest {
    pub vendor_id: i64,
    pub pickup_type: String,
    pub base_charge: Decimal,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSlabRequest {
    pub vendor_id: i64,
    pub amount_from: Decimal,
    pub amount_to: Decimal,
    pub charge_amount: Decimal,
    pub slab_label: Option<String>,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiverRequest {
    pub customer_id: String,
    pub waiver_type: String,
    pub waiver_percentage: Option<Decimal>,
    pub waiver_cap_amount: Option<Decimal>,
    pub waiver_from: NaiveDate,
    pub waiver_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFormatRequest {
    pub vendor_id: i64,
    pub format_name: String,
    /// Header mapping object, see vendor canonicalization
    pub header_mapping: serde_json::Value,
    pub effective_from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared response for master change requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterChangeResponse {
    pub entity_id: i64,
    pub approval_id: i64,
    pub status: String,
}

// ============================================================
// Read models
// ============================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VendorMasterRow {
    pub vendor_id: i64,
    pub vendor_code: String,
    pub vendor_name: String,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_by: String,
    pub created_date: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BankStoreRow {
    pub store_id: i64,
    pub bank_store_code: String,
    pub store_name: Option<String>,
    pub sol_id: Option<String>,
    pub location: Option<String>,
    pub frequency: Option<String>,
    pub daily_pickup_limit: Option<Decimal>,
    pub deposition_branch: Option<String>,
    pub deposition_branch_name: Option<String>,
    pub fixed_charge: Option<Decimal>,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreMappingRow {
    pub mapping_id: i64,
    pub vendor_id: i64,
    pub vendor_store_code: String,
    pub bank_store_code: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub account_no: Option<String>,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub created_by: String,
}

/// Mapping row enriched with its latest approval status, for the workbench
#[derive(Debug, Clone, Serialize)]
pub struct StoreMappingWithApproval {
    #[serde(flatten)]
    pub mapping: StoreMappingRow,
    pub approval_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChargeConfigRow {
    pub config_id: i64,
    pub config_code: String,
    pub config_name: String,
    pub value_number: Option<Decimal>,
    pub value_text: Option<String>,
    pub value_date: Option<NaiveDate>,
    pub unit_of_measure: Option<String>,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PickupRuleRow {
    pub rule_id: i64,
    pub pickup_type: String,
    pub free_limit: Option<i64>,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VendorChargeRow {
    pub vendor_charge_id: i64,
    pub vendor_id: i64,
    pub pickup_type: String,
    pub base_charge: Decimal,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerSlabRow {
    pub slab_id: i64,
    pub vendor_id: i64,
    pub amount_from: Decimal,
    pub amount_to: Decimal,
    pub charge_amount: Decimal,
    pub slab_label: Option<String>,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WaiverRow {
    pub waiver_id: i64,
    pub customer_id: String,
    pub waiver_type: String,
    pub waiver_percentage: Option<Decimal>,
    pub waiver_cap_amount: Option<Decimal>,
    pub waiver_from: NaiveDate,
    pub waiver_to: Option<NaiveDate>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileFormatRow {
    pub format_id: i64,
    pub vendor_id: i64,
    pub format_name: String,
    pub header_mapping_json: String,
    pub status: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}
