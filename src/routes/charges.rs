//! Charge Computation API Routes
//!
//! - POST /api/charges/vendor/compute
//! - POST /api/charges/customer/compute
//! - GET  /api/charges/vendor
//! - GET  /api/charges/customer

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::charges_v1::{
    ComputeChargesRequest, ComputeChargesResponse, CustomerChargeSummaryRow,
    VendorChargeSummaryRow,
};
use crate::repos::charge_repo;
use crate::routes::error::ApiError;
use crate::services::charges::{self, ChargeError};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

fn map_error(error: ChargeError) -> ApiError {
    match error {
        ChargeError::InvalidMonthKey(_) => ApiError::bad_request(error.to_string()),
        ChargeError::MonthLocked(_)
        | ChargeError::AlreadyComputed(_)
        | ChargeError::AlreadyComputedForVendor { .. } => ApiError::conflict(error.to_string()),
        ChargeError::MissingBeatRate(_) | ChargeError::MissingCallRate(_) => {
            ApiError::bad_request(error.to_string())
        }
        ChargeError::Database(e) => e.into(),
    }
}

/// Handler for POST /api/charges/vendor/compute
pub async fn compute_vendor(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<ComputeChargesRequest>,
) -> Result<Json<ComputeChargesResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = charges::compute_vendor_charges(&pool, &actor.employee_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Handler for POST /api/charges/customer/compute
pub async fn compute_customer(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<ComputeChargesRequest>,
) -> Result<Json<ComputeChargesResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    let response = charges::compute_customer_charges(&pool, &actor.employee_id, request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SummariesQuery {
    pub month_key: Option<String>,
}

/// Handler for GET /api/charges/vendor
pub async fn list_vendor_summaries(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<SummariesQuery>,
) -> Result<Json<Vec<VendorChargeSummaryRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(charge_repo::list_vendor_summaries(&pool, query.month_key.as_deref()).await?))
}

/// Handler for GET /api/charges/customer
pub async fn list_customer_summaries(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<SummariesQuery>,
) -> Result<Json<Vec<CustomerChargeSummaryRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(charge_repo::list_customer_summaries(&pool, query.month_key.as_deref()).await?))
}
