//! Approval Queue API Routes
//!
//! - GET  /api/approvals/pending
//! - GET  /api/approvals/clarifications   requests awaiting the caller
//! - GET  /api/approvals/{id}
//! - POST /api/approvals/{id}/approve
//! - POST /api/approvals/{id}/reject
//! - POST /api/approvals/{id}/clarify
//! - POST /api/approvals/{id}/resubmit

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::approvals_v1::{
    ApprovalRow, DecisionRequest, DecisionResponse, ResubmitRequest,
};
use crate::repos::approval_repo;
use crate::routes::error::ApiError;
use crate::services::approvals::{self, ApprovalError, Decision};

fn map_error(error: ApprovalError) -> ApiError {
    match error {
        ApprovalError::NotFound => ApiError::not_found(error.to_string()),
        ApprovalError::NotPending(_) | ApprovalError::MonthLocked(_) => {
            ApiError::conflict(error.to_string())
        }
        ApprovalError::CommentRequired
        | ApprovalError::MakerCannotApprove
        | ApprovalError::MissingEntity
        | ApprovalError::UnsupportedEntity(_) => ApiError::bad_request(error.to_string()),
        ApprovalError::CheckerMismatch | ApprovalError::NotMaker => {
            ApiError::forbidden(error.to_string())
        }
        ApprovalError::BadPayload(e) => {
            tracing::error!(error = %e, "corrupt approval payload");
            ApiError::internal("Stored approval payload is corrupt")
        }
        ApprovalError::Database(e) => e.into(),
    }
}

/// Handler for GET /api/approvals/pending
pub async fn list_pending(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<ApprovalRow>>, ApiError> {
    actor.require_roles(&[Role::Checker, Role::Admin])?;
    Ok(Json(approval_repo::list_pending(&pool).await?))
}

/// Handler for GET /api/approvals/{approval_id}
pub async fn get_approval(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(approval_id): Path<i64>,
) -> Result<Json<ApprovalRow>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Checker, Role::Admin, Role::Auditor])?;
    let approval = approval_repo::find(&pool, approval_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval request not found"))?;
    Ok(Json(approval))
}

/// Handler for GET /api/approvals/clarifications
pub async fn list_clarifications(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<ApprovalRow>>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    Ok(Json(approval_repo::list_clarifications(&pool, &actor.employee_id).await?))
}

/// Handler for POST /api/approvals/{approval_id}/approve
pub async fn approve(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(approval_id): Path<i64>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Checker, Role::Admin])?;
    let response =
        approvals::decide(&pool, &actor.employee_id, approval_id, request, Decision::Approve)
            .await
            .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/approvals/{approval_id}/reject
pub async fn reject(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(approval_id): Path<i64>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Checker, Role::Admin])?;
    let response =
        approvals::decide(&pool, &actor.employee_id, approval_id, request, Decision::Reject)
            .await
            .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/approvals/{approval_id}/clarify
pub async fn clarify(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(approval_id): Path<i64>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Checker, Role::Admin])?;
    let response = approvals::clarify(&pool, &actor.employee_id, approval_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/approvals/{approval_id}/resubmit
pub async fn resubmit(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(approval_id): Path<i64>,
    Json(request): Json<ResubmitRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = approvals::resubmit(&pool, &actor.employee_id, approval_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}
