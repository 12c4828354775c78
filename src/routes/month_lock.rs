//! Month Lock API Routes
//!
//! - POST /api/month-locks    lock a month
//! - GET  /api/month-locks    list locks
//!
//! A month cannot be locked while any approval request is still PENDING,
//! and locking is not repeatable.

use axum::{extract::State, Json};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::month_lock_v1::{MonthLockRequest, MonthLockResponse, MonthLockRow};
use crate::repos::{approval_repo, audit_repo, month_lock_repo};
use crate::routes::error::ApiError;
use crate::services::period::MonthKey;

/// Handler for POST /api/month-locks
pub async fn lock_month(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<MonthLockRequest>,
) -> Result<Json<MonthLockResponse>, ApiError> {
    actor.require_roles(&[Role::Admin])?;

    let month = MonthKey::parse(&request.month_key)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let month_key = month.as_string();

    if month_lock_repo::is_locked(&pool, &month_key).await? {
        return Err(ApiError::conflict(format!("Month {month_key} is already locked")));
    }

    let pending = approval_repo::count_pending(&pool).await?;
    if pending > 0 {
        return Err(ApiError::conflict(format!(
            "Cannot lock month: {pending} approval request(s) still pending"
        )));
    }

    let mut tx = pool.begin().await?;
    month_lock_repo::insert_lock(&mut tx, &month_key, &actor.employee_id).await?;
    audit_repo::log(
        &mut tx,
        "MONTH_LOCK",
        None,
        "LOCK",
        None,
        Some(&format!(r#"{{"month_key":"{month_key}"}}"#)),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(%month_key, locked_by = %actor.employee_id, "month locked");

    Ok(Json(MonthLockResponse {
        month_key,
        status: "LOCKED".to_string(),
    }))
}

/// Handler for GET /api/month-locks
pub async fn list_locks(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<MonthLockRow>>, ApiError> {
    actor.require_roles(&[Role::Admin, Role::Auditor])?;
    Ok(Json(month_lock_repo::list(&pool).await?))
}
