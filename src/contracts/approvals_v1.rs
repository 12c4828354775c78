//! Maker-Checker Approval V1 Contract Types
//!
//! Every state-changing proposal (master edits, corrections, remittance
//! decisions, exception resolutions) lands in the approval queue as a
//! PENDING request carrying original and proposed payloads. A checker
//! approves, rejects, or asks for clarification; the maker may resubmit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApprovalRow {
    pub approval_id: i64,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub original_data: String,
    pub proposed_data: String,
    pub reason: Option<String>,
    pub maker_id: String,
    pub checker_id: Option<String>,
    pub checker_comment: Option<String>,
    pub comments_history: Option<String>,
    pub status: String,
    pub created_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
}

// ============================================================
// Decision endpoints: POST /api/approvals/{id}/approve | reject | clarify
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub checker_id: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub approval_id: i64,
    pub status: String,
}

// ============================================================
// Resubmit: POST /api/approvals/{id}/resubmit (maker only)
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResubmitRequest {
    pub comment: String,
    /// Optional revised payload; retains the original proposal when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_data: Option<serde_json::Value>,
}
