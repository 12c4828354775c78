//! Upload Ingestion V1 Contract Types
//!
//! Covers the two file ingestion surfaces:
//! - Ledger uploads: core-banking collection extracts, one batch per MIS date
//! - Vendor uploads: CMS pickup files, one batch per (vendor, MIS date)
//!
//! Files arrive as pre-parsed row objects (header -> cell value). Rows that
//! fail canonicalization are quarantined, not dropped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================
// Ledger Upload: POST /api/uploads/ledger
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerUploadRequest {
    /// MIS date the file covers (one batch per date, ever)
    pub mis_date: NaiveDate,

    pub file_name: String,

    /// Parsed rows, keyed by the fixed ledger header names
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerUploadResponse {
    pub batch_id: i64,
    pub mis_date: NaiveDate,
    pub status: String,
    pub total_rows: usize,
    pub canonical_rows: usize,
    pub quarantined_rows: usize,
}

// ============================================================
// Vendor Upload: POST /api/uploads/vendor
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorUploadRequest {
    pub vendor_code: String,
    pub mis_date: NaiveDate,
    pub file_name: String,

    /// Parsed rows, keyed by the vendor's own header names
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorUploadResponse {
    pub batch_id: i64,
    pub vendor_id: i64,
    pub mis_date: NaiveDate,
    pub status: String,
    pub total_rows: usize,
    pub canonical_rows: usize,
    pub quarantined_rows: usize,

    /// Store codes that had no active mapping (batch fails when non-empty)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unmapped_store_codes: Vec<String>,
}

// ============================================================
// Vendor Dry-Run Validation: POST /api/uploads/vendor/validate
// ============================================================

/// Same payload as a vendor upload, but nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorValidateRequest {
    pub vendor_code: String,
    pub mis_date: NaiveDate,
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorValidateResponse {
    /// OK, UNMAPPED or OUT_OF_RANGE
    pub status: String,

    pub total_rows: usize,

    /// Rows that would be quarantined for missing required fields
    pub invalid_rows: usize,

    /// Store codes with no mapping at any point in time
    pub unmapped_codes: Vec<String>,

    /// Store codes mapped at some point, but not covering a row's pickup date
    pub out_of_range_codes: Vec<String>,
}

// ============================================================
// Batch listings
// ============================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LedgerBatchRow {
    pub batch_id: i64,
    pub mis_date: NaiveDate,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VendorBatchRow {
    pub batch_id: i64,
    pub vendor_id: i64,
    pub mis_date: NaiveDate,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvalidRecordRow {
    pub invalid_id: i64,
    pub batch_id: i64,
    pub row_number: i64,
    pub reason: String,
    pub row_payload: String,
}
