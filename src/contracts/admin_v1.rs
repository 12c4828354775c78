//! Administrative Cleanup V1 Contract Types
//!
//! Destructive resets used on test and staging environments. Each request
//! must restate the literal confirmation phrase and a reason; both are
//! written to the audit log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRequest {
    /// One of UPLOADS, TRANSACTIONS, RECONCILIATION, APPROVALS,
    /// VENDORS_STORES, MASTERS, ALL
    pub target: String,

    pub reason: String,

    /// Must equal "CONFIRM"
    pub confirm_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub target: String,
    /// Rows deleted per table
    pub deleted: BTreeMap<String, u64>,
}
