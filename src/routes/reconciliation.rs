//! Reconciliation API Routes
//!
//! - POST /api/reconciliation/run                      run for a date
//! - GET  /api/reconciliation/results                  list results
//! - POST /api/reconciliation/{recon_id}/corrections   propose an amount edit
//! - GET  /api/reconciliation/corrections              list corrections

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::recon_v1::{
    CorrectionRequest, CorrectionResponse, CorrectionRow, ReconResultRow, ReconRunRequest,
    ReconRunResponse,
};
use crate::repos::{approval_repo, recon_repo};
use crate::routes::error::ApiError;
use crate::services::approvals::{self, RECONCILIATION_CORRECTION};
use crate::services::period::{ensure_month_open, MonthKey};
use crate::services::recon::{self, ReconError};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

fn map_error(error: ReconError) -> ApiError {
    match error {
        ReconError::LedgerNotUploaded(_) => ApiError::not_found(error.to_string()),
        ReconError::MonthLocked(_) => ApiError::conflict(error.to_string()),
        ReconError::Database(e) => e.into(),
    }
}

/// Handler for POST /api/reconciliation/run
pub async fn run_reconciliation(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<ReconRunRequest>,
) -> Result<Json<ReconRunResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Checker, Role::Admin])?;
    let response = recon::run(&pool, &actor.employee_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub date: Option<NaiveDate>,
}

/// Handler for GET /api/reconciliation/results
pub async fn list_results(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<ReconResultRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(recon::list_results(&pool, query.date).await?))
}

/// Handler for POST /api/reconciliation/{recon_id}/corrections
///
/// Creates the correction and its approval request together; the amounts
/// change only when a checker approves.
pub async fn request_correction(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(recon_id): Path<i64>,
    Json(request): Json<CorrectionRequest>,
) -> Result<Json<CorrectionResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;

    if request.correction_type != "AMOUNT_EDIT" {
        return Err(ApiError::bad_request(format!(
            "Unsupported correction type: {}",
            request.correction_type
        )));
    }
    if request.pickup_amount.is_none() && request.remittance_amount.is_none() {
        return Err(ApiError::bad_request("No corrected amounts supplied"));
    }
    if request.reason.trim().is_empty() {
        return Err(ApiError::bad_request("Reason is required"));
    }

    let result = recon_repo::find_result(&pool, recon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Reconciliation result not found"))?;

    if let Some(base_date) = result.remittance_date.or(result.pickup_date) {
        ensure_month_open(&pool, &MonthKey::from_date(base_date)).await?;
    }

    let original = serde_json::to_string(&result)
        .map_err(|_| ApiError::internal("Failed to snapshot result"))?;
    let proposed = serde_json::to_string(&request)
        .map_err(|_| ApiError::internal("Failed to serialize correction"))?;

    let mut tx = pool.begin().await?;
    let approval_id = approvals::submit(
        &mut tx,
        RECONCILIATION_CORRECTION,
        None,
        &original,
        &proposed,
        Some(&request.reason),
        &actor.employee_id,
    )
    .await?;
    let correction_id =
        approval_repo::insert_correction(&mut tx, recon_id, approval_id, &proposed, &actor.employee_id)
            .await?;
    approval_repo::update_entity_id(&mut tx, approval_id, correction_id).await?;
    tx.commit().await?;

    Ok(Json(CorrectionResponse {
        correction_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CorrectionsQuery {
    pub recon_id: Option<i64>,
}

/// Handler for GET /api/reconciliation/corrections
pub async fn list_corrections(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<CorrectionsQuery>,
) -> Result<Json<Vec<CorrectionRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(approval_repo::list_corrections(&pool, query.recon_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn run_without_ledger_batch_maps_to_not_found() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let err = map_error(ReconError::LedgerNotUploaded(date));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains("2025-02-10"));
    }

    #[test]
    fn locked_month_maps_to_conflict() {
        let err = map_error(ReconError::MonthLocked("202502".to_string()));
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
