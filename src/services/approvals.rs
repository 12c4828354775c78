//! Maker-checker approval workflow.
//!
//! One queue handles every entity kind. The decision rules are uniform:
//! a comment is mandatory, the acting user must match the checker id on the
//! request, and the maker of a request can never decide it. Approval applies
//! the entity-specific effect inside the same transaction that flips the
//! request, so a failed effect leaves the request PENDING.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::contracts::approvals_v1::{DecisionRequest, DecisionResponse, ResubmitRequest};
use crate::contracts::recon_v1::CorrectionRequest;
use crate::repos::master_repo::MasterKind;
use crate::repos::{approval_repo, audit_repo, master_repo, recon_repo, upload_repo};
use crate::services::period::{ensure_month_open_tx, LockError, MonthKey};

// Entity type tags carried on approval requests.
pub const VENDOR_MASTER: &str = "VENDOR_MASTER";
pub const BANK_STORE: &str = "BANK_STORE";
pub const STORE_MAPPING: &str = "STORE_MAPPING";
pub const CHARGE_CONFIG: &str = "CHARGE_CONFIG";
pub const PICKUP_RULE: &str = "PICKUP_RULE";
pub const VENDOR_CHARGE: &str = "VENDOR_CHARGE";
pub const CUSTOMER_CHARGE_SLAB: &str = "CUSTOMER_CHARGE_SLAB";
pub const WAIVER: &str = "WAIVER";
pub const VENDOR_FILE_FORMAT: &str = "VENDOR_FILE_FORMAT";
pub const REMITTANCE: &str = "REMITTANCE";
pub const EXCEPTION_RESOLUTION: &str = "EXCEPTION_RESOLUTION";
pub const RECONCILIATION_CORRECTION: &str = "RECONCILIATION_CORRECTION";

pub fn master_kind_for(entity_type: &str) -> Option<MasterKind> {
    match entity_type {
        VENDOR_MASTER => Some(MasterKind::Vendor),
        BANK_STORE => Some(MasterKind::BankStore),
        STORE_MAPPING => Some(MasterKind::StoreMapping),
        CHARGE_CONFIG => Some(MasterKind::ChargeConfig),
        PICKUP_RULE => Some(MasterKind::PickupRule),
        VENDOR_CHARGE => Some(MasterKind::VendorCharge),
        CUSTOMER_CHARGE_SLAB => Some(MasterKind::CustomerSlab),
        WAIVER => Some(MasterKind::Waiver),
        VENDOR_FILE_FORMAT => Some(MasterKind::FileFormat),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Approval request not found")]
    NotFound,

    #[error("Approval request is not pending (status: {0})")]
    NotPending(String),

    #[error("Comment is required")]
    CommentRequired,

    #[error("Checker mismatch")]
    CheckerMismatch,

    #[error("Maker cannot approve")]
    MakerCannotApprove,

    #[error("Only the original maker can resubmit")]
    NotMaker,

    #[error("Approval request has no target entity")]
    MissingEntity,

    #[error("Unsupported entity type: {0}")]
    UnsupportedEntity(String),

    #[error("Stored payload is not valid JSON: {0}")]
    BadPayload(#[from] serde_json::Error),

    #[error("Month {0} is locked")]
    MonthLocked(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LockError> for ApprovalError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Locked(key) => ApprovalError::MonthLocked(key),
            LockError::Database(e) => ApprovalError::Database(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVED",
            Decision::Reject => "REJECTED",
        }
    }
}

// ============================================================
// Comment history
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentEntry {
    pub role: String,
    pub user_id: String,
    pub comment: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Start a history with the maker's submission comment.
pub fn init_history(role: &str, user_id: &str, comment: &str) -> String {
    let entry = CommentEntry {
        role: role.to_string(),
        user_id: user_id.to_string(),
        comment: comment.to_string(),
        timestamp: chrono::Utc::now(),
    };
    serde_json::to_string(&vec![entry]).unwrap_or_else(|_| "[]".to_string())
}

/// Append to a history, tolerating missing or malformed prior state.
pub fn append_history(existing: Option<&str>, role: &str, user_id: &str, comment: &str) -> String {
    let mut entries: Vec<CommentEntry> = existing
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    entries.push(CommentEntry {
        role: role.to_string(),
        user_id: user_id.to_string(),
        comment: comment.to_string(),
        timestamp: chrono::Utc::now(),
    });
    serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
}

/// Uniform checker-side validation for approve, reject and clarify.
pub fn check_decision(
    maker_id: &str,
    actor_id: &str,
    checker_id: &str,
    comment: &str,
) -> Result<(), ApprovalError> {
    if comment.trim().is_empty() {
        return Err(ApprovalError::CommentRequired);
    }
    if checker_id != actor_id {
        return Err(ApprovalError::CheckerMismatch);
    }
    if maker_id == actor_id {
        return Err(ApprovalError::MakerCannotApprove);
    }
    Ok(())
}

/// Correction outcome after rewriting amounts.
pub fn correction_outcome(
    pickup: Option<Decimal>,
    remittance: Option<Decimal>,
) -> (&'static str, Option<&'static str>) {
    match (pickup, remittance) {
        (Some(p), Some(r)) if p == r => ("MATCHED", None),
        _ => ("AMOUNT_MISMATCH", Some("Amount mismatch after correction")),
    }
}

// ============================================================
// Submission
// ============================================================

/// Create a PENDING request inside the caller's transaction.
#[allow(clippy::too_many_arguments)]
pub async fn submit(
    tx: &mut Transaction<'_, Postgres>,
    entity_type: &str,
    entity_id: Option<i64>,
    original_data: &str,
    proposed_data: &str,
    reason: Option<&str>,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    let history = init_history("MAKER", maker_id, reason.unwrap_or("Submitted for approval"));
    let approval_id = approval_repo::insert_request(
        tx,
        entity_type,
        entity_id,
        original_data,
        proposed_data,
        reason,
        maker_id,
        Some(&history),
    )
    .await?;
    audit_repo::log(
        tx,
        entity_type,
        entity_id,
        "SUBMIT",
        None,
        Some(proposed_data),
        maker_id,
    )
    .await?;
    Ok(approval_id)
}

// ============================================================
// Decisions
// ============================================================

#[derive(Debug, Deserialize)]
struct ProposedAction {
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProposedRejection {
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProposedResolution {
    #[serde(default)]
    remarks: Option<String>,
}

/// Approve or reject a pending request and apply the entity effect.
pub async fn decide(
    pool: &PgPool,
    actor_id: &str,
    approval_id: i64,
    req: DecisionRequest,
    decision: Decision,
) -> Result<DecisionResponse, ApprovalError> {
    let mut tx = pool.begin().await?;

    let approval = approval_repo::find_for_update(&mut tx, approval_id)
        .await?
        .ok_or(ApprovalError::NotFound)?;
    if approval.status != "PENDING" {
        return Err(ApprovalError::NotPending(approval.status));
    }
    check_decision(&approval.maker_id, actor_id, &req.checker_id, &req.comment)?;

    if decision == Decision::Approve {
        apply_approval_effect(&mut tx, &approval, actor_id).await?;
    } else {
        apply_rejection_effect(&mut tx, &approval, actor_id).await?;
    }

    let status = decision.status();
    let history = append_history(
        approval.comments_history.as_deref(),
        "CHECKER",
        actor_id,
        &req.comment,
    );
    approval_repo::update_decision(&mut tx, approval_id, status, actor_id, &req.comment, &history)
        .await?;
    audit_repo::log(
        &mut tx,
        &approval.entity_type,
        approval.entity_id,
        status,
        Some(&approval.original_data),
        Some(&approval.proposed_data),
        actor_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(approval_id, entity_type = %approval.entity_type, status, "approval decided");

    Ok(DecisionResponse {
        approval_id,
        status: status.to_string(),
    })
}

async fn apply_approval_effect(
    tx: &mut Transaction<'_, Postgres>,
    approval: &crate::contracts::approvals_v1::ApprovalRow,
    checker_id: &str,
) -> Result<(), ApprovalError> {
    if let Some(kind) = master_kind_for(&approval.entity_type) {
        let entity_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
        let proposed: ProposedAction = serde_json::from_str(&approval.proposed_data)?;
        match proposed.action.as_deref() {
            Some("DEACTIVATE") => master_repo::deactivate(tx, kind, entity_id, checker_id).await?,
            _ => master_repo::activate(tx, kind, entity_id, checker_id).await?,
        }
        return Ok(());
    }

    match approval.entity_type.as_str() {
        RECONCILIATION_CORRECTION => {
            let correction_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
            let correction = approval_repo::find_correction(tx, correction_id)
                .await?
                .ok_or(ApprovalError::MissingEntity)?;
            let proposed: CorrectionRequest = serde_json::from_str(&correction.proposed_data)?;
            let result = recon_repo::find_result_tx(tx, correction.recon_id)
                .await?
                .ok_or(ApprovalError::MissingEntity)?;

            if let Some(base_date) = result.remittance_date.or(result.pickup_date) {
                ensure_month_open_tx(tx, &MonthKey::from_date(base_date)).await?;
            }

            let pickup = proposed.pickup_amount.or(result.pickup_amount);
            let remittance = proposed.remittance_amount.or(result.remittance_amount);
            let (status, reason) = correction_outcome(pickup, remittance);

            recon_repo::update_result_amounts(
                tx,
                correction.recon_id,
                proposed.pickup_amount,
                proposed.remittance_amount,
                status,
                reason,
            )
            .await?;
            if status == "MATCHED" {
                recon_repo::resolve_open_exceptions(
                    tx,
                    correction.recon_id,
                    checker_id,
                    "Auto-resolved after amount correction",
                )
                .await?;
            }
            approval_repo::update_correction_status(tx, correction_id, "APPROVED", checker_id)
                .await?;
            Ok(())
        }
        REMITTANCE => {
            let remittance_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
            upload_repo::update_remittance_status(tx, remittance_id, "APPROVED", checker_id, None)
                .await?;
            Ok(())
        }
        EXCEPTION_RESOLUTION => {
            let exception_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
            if let Some(base_date) = recon_repo::exception_base_date_tx(tx, exception_id).await? {
                ensure_month_open_tx(tx, &MonthKey::from_date(base_date)).await?;
            }
            let proposed: ProposedResolution = serde_json::from_str(&approval.proposed_data)?;
            recon_repo::resolve_exception(
                tx,
                exception_id,
                checker_id,
                proposed.remarks.as_deref().unwrap_or("Resolved via approval"),
            )
            .await?;
            Ok(())
        }
        other => Err(ApprovalError::UnsupportedEntity(other.to_string())),
    }
}

async fn apply_rejection_effect(
    tx: &mut Transaction<'_, Postgres>,
    approval: &crate::contracts::approvals_v1::ApprovalRow,
    checker_id: &str,
) -> Result<(), ApprovalError> {
    // Rejected master candidates simply stay INACTIVE.
    match approval.entity_type.as_str() {
        RECONCILIATION_CORRECTION => {
            let correction_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
            approval_repo::update_correction_status(tx, correction_id, "REJECTED", checker_id)
                .await?;
        }
        REMITTANCE => {
            let remittance_id = approval.entity_id.ok_or(ApprovalError::MissingEntity)?;
            let proposed: ProposedRejection = serde_json::from_str(&approval.proposed_data)?;
            upload_repo::update_remittance_status(
                tx,
                remittance_id,
                "REJECTED",
                checker_id,
                proposed.rejection_reason.as_deref(),
            )
            .await?;
        }
        _ => {}
    }
    Ok(())
}

/// Send a pending request back to its maker for clarification.
pub async fn clarify(
    pool: &PgPool,
    actor_id: &str,
    approval_id: i64,
    req: DecisionRequest,
) -> Result<DecisionResponse, ApprovalError> {
    let mut tx = pool.begin().await?;

    let approval = approval_repo::find_for_update(&mut tx, approval_id)
        .await?
        .ok_or(ApprovalError::NotFound)?;
    if approval.status != "PENDING" {
        return Err(ApprovalError::NotPending(approval.status));
    }
    check_decision(&approval.maker_id, actor_id, &req.checker_id, &req.comment)?;

    let history = append_history(
        approval.comments_history.as_deref(),
        "CHECKER",
        actor_id,
        &req.comment,
    );
    approval_repo::update_decision(
        &mut tx,
        approval_id,
        "CLARIFICATION",
        actor_id,
        &req.comment,
        &history,
    )
    .await?;
    audit_repo::log(
        &mut tx,
        &approval.entity_type,
        approval.entity_id,
        "CLARIFY",
        None,
        None,
        actor_id,
    )
    .await?;
    tx.commit().await?;

    Ok(DecisionResponse {
        approval_id,
        status: "CLARIFICATION".to_string(),
    })
}

/// Maker answers a clarification and puts the request back in the queue.
pub async fn resubmit(
    pool: &PgPool,
    actor_id: &str,
    approval_id: i64,
    req: ResubmitRequest,
) -> Result<DecisionResponse, ApprovalError> {
    if req.comment.trim().is_empty() {
        return Err(ApprovalError::CommentRequired);
    }

    let mut tx = pool.begin().await?;

    let approval = approval_repo::find_for_update(&mut tx, approval_id)
        .await?
        .ok_or(ApprovalError::NotFound)?;
    if approval.status != "CLARIFICATION" {
        return Err(ApprovalError::NotPending(approval.status));
    }
    if approval.maker_id != actor_id {
        return Err(ApprovalError::NotMaker);
    }

    let history = append_history(
        approval.comments_history.as_deref(),
        "MAKER",
        actor_id,
        &req.comment,
    );
    let proposed = req.proposed_data.as_ref().map(|v| v.to_string());
    approval_repo::resubmit(&mut tx, approval_id, proposed.as_deref(), &history).await?;
    audit_repo::log(
        &mut tx,
        &approval.entity_type,
        approval.entity_id,
        "RESUBMIT",
        None,
        proposed.as_deref(),
        actor_id,
    )
    .await?;
    tx.commit().await?;

    Ok(DecisionResponse {
        approval_id,
        status: "PENDING".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn decision_requires_comment() {
        assert!(matches!(
            check_decision("maker1", "checker1", "checker1", "  "),
            Err(ApprovalError::CommentRequired)
        ));
    }

    #[test]
    fn decision_rejects_checker_mismatch() {
        assert!(matches!(
            check_decision("maker1", "checker1", "someone-else", "ok"),
            Err(ApprovalError::CheckerMismatch)
        ));
    }

    #[test]
    fn maker_cannot_decide_own_request() {
        assert!(matches!(
            check_decision("maker1", "maker1", "maker1", "ok"),
            Err(ApprovalError::MakerCannotApprove)
        ));
    }

    #[test]
    fn valid_decision_passes() {
        assert!(check_decision("maker1", "checker1", "checker1", "verified").is_ok());
    }

    #[test]
    fn history_accumulates_in_order() {
        let h1 = init_history("MAKER", "m1", "please review");
        let h2 = append_history(Some(&h1), "CHECKER", "c1", "needs detail");
        let entries: Vec<CommentEntry> = serde_json::from_str(&h2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, "MAKER");
        assert_eq!(entries[1].user_id, "c1");
    }

    #[test]
    fn history_survives_malformed_prior_state() {
        let h = append_history(Some("not json"), "CHECKER", "c1", "hello");
        let entries: Vec<CommentEntry> = serde_json::from_str(&h).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn corrected_equal_amounts_match() {
        let amt = Decimal::from_str("150.00").unwrap();
        assert_eq!(correction_outcome(Some(amt), Some(amt)), ("MATCHED", None));
    }

    #[test]
    fn corrected_unequal_amounts_stay_mismatched() {
        let (status, reason) = correction_outcome(
            Decimal::from_str("150.00").ok(),
            Decimal::from_str("151.00").ok(),
        );
        assert_eq!(status, "AMOUNT_MISMATCH");
        assert_eq!(reason, Some("Amount mismatch after correction"));
    }
}
