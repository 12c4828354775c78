//! Exception Workbench API Routes
//!
//! - GET  /api/exceptions                             list (optional status)
//! - POST /api/exceptions                             manual exception entry
//! - POST /api/exceptions/{id}/resolve-request        maker proposes a resolution

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::approvals_v1::DecisionResponse;
use crate::contracts::recon_v1::{ExceptionCreateRequest, ExceptionResolveRequest, ExceptionRow};
use crate::repos::{audit_repo, recon_repo};
use crate::routes::error::ApiError;
use crate::services::approvals::{self, EXCEPTION_RESOLUTION};
use crate::services::period::{ensure_month_open, MonthKey};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

/// Exceptions tied to a reconciliation result are gated on the month of the
/// result's business date.
async fn ensure_recon_month_open(
    pool: &PgPool,
    result: &crate::contracts::recon_v1::ReconResultRow,
) -> Result<(), ApiError> {
    if let Some(base_date) = result.remittance_date.or(result.pickup_date) {
        ensure_month_open(pool, &MonthKey::from_date(base_date)).await?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ExceptionsQuery {
    pub status: Option<String>,
}

/// Handler for GET /api/exceptions
pub async fn list_exceptions(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<ExceptionsQuery>,
) -> Result<Json<Vec<ExceptionRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(recon_repo::list_exceptions(&pool, query.status.as_deref()).await?))
}

/// Handler for POST /api/exceptions
///
/// Records an exception raised outside the reconciliation engine, for
/// example a discrepancy spotted during a branch visit.
pub async fn create_exception(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<ExceptionCreateRequest>,
) -> Result<Json<ExceptionRow>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;

    if request.exception_type.trim().is_empty() {
        return Err(ApiError::bad_request("Exception type is required"));
    }
    if let Some(recon_id) = request.recon_id {
        let result = recon_repo::find_result(&pool, recon_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Reconciliation result not found"))?;
        ensure_recon_month_open(&pool, &result).await?;
    }

    let mut tx = pool.begin().await?;
    let exception_id = recon_repo::insert_exception(
        &mut tx,
        request.recon_id,
        &request.exception_type,
        request.details.as_deref(),
        &actor.employee_id,
    )
    .await?;
    audit_repo::log(
        &mut tx,
        "EXCEPTION",
        Some(exception_id),
        "CREATE",
        None,
        request.details.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    let exception = recon_repo::find_exception(&pool, exception_id)
        .await?
        .ok_or_else(|| ApiError::internal("Exception vanished after insert"))?;
    Ok(Json(exception))
}

/// Handler for POST /api/exceptions/{exception_id}/resolve-request
///
/// The exception closes only when a checker approves the request.
pub async fn request_resolution(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(exception_id): Path<i64>,
    Json(request): Json<ExceptionResolveRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;

    if request.remarks.trim().is_empty() {
        return Err(ApiError::bad_request("Remarks are required"));
    }

    let exception = recon_repo::find_exception(&pool, exception_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exception not found"))?;
    if exception.status != "OPEN" {
        return Err(ApiError::conflict(format!(
            "Exception is not open (status: {})",
            exception.status
        )));
    }
    if let Some(recon_id) = exception.recon_id {
        let result = recon_repo::find_result(&pool, recon_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Reconciliation result not found"))?;
        ensure_recon_month_open(&pool, &result).await?;
    }

    let original = serde_json::to_string(&exception)
        .map_err(|_| ApiError::internal("Failed to snapshot exception"))?;
    let proposed = serde_json::json!({ "remarks": request.remarks }).to_string();

    let mut tx = pool.begin().await?;
    let approval_id = approvals::submit(
        &mut tx,
        EXCEPTION_RESOLUTION,
        Some(exception_id),
        &original,
        &proposed,
        Some(&request.remarks),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(DecisionResponse {
        approval_id,
        status: "PENDING".to_string(),
    }))
}
