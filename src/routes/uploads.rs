//! Upload Ingestion API Routes
//!
//! - POST /api/uploads/ledger            ingest a ledger extract
//! - POST /api/uploads/vendor            ingest a vendor pickup file
//! - POST /api/uploads/vendor/validate   dry-run mapping validation
//! - GET  /api/uploads/ledger            list ledger batches
//! - GET  /api/uploads/vendor            list vendor batches
//! - GET  /api/uploads/{kind}/{batch_id}/invalid  quarantined rows

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::uploads_v1::{
    InvalidRecordRow, LedgerBatchRow, LedgerUploadRequest, LedgerUploadResponse, VendorBatchRow,
    VendorUploadRequest, VendorUploadResponse, VendorValidateRequest, VendorValidateResponse,
};
use crate::repos::upload_repo;
use crate::routes::error::ApiError;
use crate::services::uploads::{self, UploadError};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

fn map_error(error: UploadError) -> ApiError {
    match error {
        UploadError::DuplicateLedgerBatch(_) | UploadError::DuplicateVendorBatch { .. } => {
            ApiError::conflict(error.to_string())
        }
        UploadError::UnknownVendor(_) => ApiError::not_found(error.to_string()),
        UploadError::NoFileFormat(_) | UploadError::InvalidFormat(_) => {
            ApiError::bad_request(error.to_string())
        }
        UploadError::MonthLocked(_) => ApiError::conflict(error.to_string()),
        UploadError::Database(e) => e.into(),
    }
}

/// Handler for POST /api/uploads/ledger
pub async fn upload_ledger(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<LedgerUploadRequest>,
) -> Result<Json<LedgerUploadResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = uploads::ingest_ledger(&pool, &actor.employee_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/uploads/vendor
pub async fn upload_vendor(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<VendorUploadRequest>,
) -> Result<Json<VendorUploadResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = uploads::ingest_vendor(&pool, &actor.employee_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/uploads/vendor/validate
pub async fn validate_vendor(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<VendorValidateRequest>,
) -> Result<Json<VendorValidateResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = uploads::validate_vendor(&pool, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for GET /api/uploads/ledger
pub async fn list_ledger_batches(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<LedgerBatchRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(upload_repo::list_ledger_batches(&pool).await?))
}

/// Handler for GET /api/uploads/vendor
pub async fn list_vendor_batches(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<VendorBatchRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(upload_repo::list_vendor_batches(&pool).await?))
}

/// Handler for GET /api/uploads/ledger/{batch_id}/invalid
pub async fn list_ledger_invalid(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(batch_id): Path<i64>,
) -> Result<Json<Vec<InvalidRecordRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(upload_repo::list_ledger_invalid(&pool, batch_id).await?))
}

/// Handler for GET /api/uploads/vendor/{batch_id}/invalid
pub async fn list_vendor_invalid(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(batch_id): Path<i64>,
) -> Result<Json<Vec<InvalidRecordRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(upload_repo::list_vendor_invalid(&pool, batch_id).await?))
}
