//! Remittance Lifecycle API Routes
//!
//! Entries move UPLOADED -> VALIDATED -> APPROVED -> CLOSED, with REJECTED
//! as the checker's alternative to APPROVED. Validation and closing are
//! direct actions; approval and rejection go through the approval queue.
//!
//! - GET  /api/remittances                           list (optional status)
//! - POST /api/remittances/{id}/validate             UPLOADED -> VALIDATED
//! - POST /api/remittances/{id}/approve-request      VALIDATED -> pending approval
//! - POST /api/remittances/{id}/close                APPROVED -> CLOSED

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::approvals_v1::DecisionResponse;
use crate::contracts::recon_v1::{RemittanceActionRequest, RemittanceRow};
use crate::repos::{audit_repo, upload_repo};
use crate::routes::error::ApiError;
use crate::services::approvals::{self, REMITTANCE};
use crate::services::period::{ensure_month_open, MonthKey};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

#[derive(Debug, Deserialize)]
pub struct RemittancesQuery {
    pub status: Option<String>,
}

/// Handler for GET /api/remittances
pub async fn list_remittances(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<RemittancesQuery>,
) -> Result<Json<Vec<RemittanceRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(upload_repo::list_remittances(&pool, query.status.as_deref()).await?))
}

async fn find_in_status(
    pool: &PgPool,
    remittance_id: i64,
    expected: &str,
) -> Result<RemittanceRow, ApiError> {
    let entry = upload_repo::find_remittance(pool, remittance_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Remittance entry not found"))?;
    if entry.status != expected {
        return Err(ApiError::conflict(format!(
            "Remittance is {} (expected {expected})",
            entry.status
        )));
    }
    Ok(entry)
}

/// Every lifecycle move is gated on the month of the entry's transaction.
async fn ensure_entry_month_open(pool: &PgPool, canonical_id: i64) -> Result<(), ApiError> {
    if let Some(base_date) = upload_repo::canonical_base_date(pool, canonical_id).await? {
        ensure_month_open(pool, &MonthKey::from_date(base_date)).await?;
    }
    Ok(())
}

/// Handler for POST /api/remittances/{remittance_id}/validate
pub async fn validate_remittance(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(remittance_id): Path<i64>,
) -> Result<Json<RemittanceRow>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let entry = find_in_status(&pool, remittance_id, "UPLOADED").await?;
    ensure_entry_month_open(&pool, entry.canonical_id).await?;

    let mut tx = pool.begin().await?;
    upload_repo::update_remittance_status(&mut tx, remittance_id, "VALIDATED", &actor.employee_id, None)
        .await?;
    audit_repo::log(
        &mut tx,
        REMITTANCE,
        Some(remittance_id),
        "VALIDATE",
        None,
        None,
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    let entry = upload_repo::find_remittance(&pool, remittance_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Remittance entry not found"))?;
    Ok(Json(entry))
}

/// Handler for POST /api/remittances/{remittance_id}/approve-request
///
/// The checker either approves (entry becomes APPROVED) or rejects; on
/// rejection the reason carried here is recorded on the entry.
pub async fn request_approval(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(remittance_id): Path<i64>,
    Json(request): Json<RemittanceActionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let entry = find_in_status(&pool, remittance_id, "VALIDATED").await?;
    ensure_entry_month_open(&pool, entry.canonical_id).await?;

    let original = serde_json::to_string(&entry)
        .map_err(|_| ApiError::internal("Failed to snapshot remittance"))?;
    let proposed = serde_json::json!({
        "action": "APPROVE",
        "rejection_reason": request.rejection_reason,
    })
    .to_string();

    let mut tx = pool.begin().await?;
    let approval_id = approvals::submit(
        &mut tx,
        REMITTANCE,
        Some(remittance_id),
        &original,
        &proposed,
        None,
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(DecisionResponse {
        approval_id,
        status: "PENDING".to_string(),
    }))
}

/// Handler for POST /api/remittances/{remittance_id}/close
pub async fn close_remittance(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(remittance_id): Path<i64>,
) -> Result<Json<RemittanceRow>, ApiError> {
    actor.require_roles(&[Role::Admin])?;
    let entry = find_in_status(&pool, remittance_id, "APPROVED").await?;
    ensure_entry_month_open(&pool, entry.canonical_id).await?;

    let mut tx = pool.begin().await?;
    upload_repo::update_remittance_status(&mut tx, remittance_id, "CLOSED", &actor.employee_id, None)
        .await?;
    audit_repo::log(
        &mut tx,
        REMITTANCE,
        Some(remittance_id),
        "CLOSE",
        None,
        None,
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    let entry = upload_repo::find_remittance(&pool, remittance_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Remittance entry not found"))?;
    Ok(Json(entry))
}
