//! Master Data API Routes
//!
//! Every master follows the same shape: a GET listing and a POST change
//! request that inserts an INACTIVE candidate row plus a PENDING approval.
//! A change request whose effective month is locked is refused. Store
//! mappings additionally support a deactivate request and expose the latest
//! approval status on their listing.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::masters_v1::*;
use crate::repos::master_repo::{self, MasterKind};
use crate::repos::approval_repo;
use crate::routes::error::ApiError;
use crate::services::approvals::{
    self, BANK_STORE, CHARGE_CONFIG, CUSTOMER_CHARGE_SLAB, PICKUP_RULE, STORE_MAPPING,
    VENDOR_CHARGE, VENDOR_FILE_FORMAT, VENDOR_MASTER, WAIVER,
};
use crate::services::period::{ensure_month_open, MonthKey};

const ALL_ROLES: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::Auditor];

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Serialize the maker's payload with the lifecycle action attached.
fn proposed_json<T: Serialize>(request: &T, action: &str) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(request)
        .map_err(|_| ApiError::internal("Failed to serialize request"))?;
    if let Some(map) = value.as_object_mut() {
        map.insert("action".to_string(), serde_json::json!(action));
    }
    Ok(value.to_string())
}

// ============================================================
// Vendors
// ============================================================

/// Handler for GET /api/masters/vendors
pub async fn list_vendors(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VendorMasterRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_vendors(&pool, query.include_inactive).await?))
}

/// Handler for POST /api/masters/vendors
pub async fn request_vendor(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<VendorMasterRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id = master_repo::insert_vendor_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        VENDOR_MASTER,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Bank stores
// ============================================================

/// Handler for GET /api/masters/bank-stores
pub async fn list_bank_stores(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BankStoreRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_bank_stores(&pool, query.include_inactive).await?))
}

/// Handler for POST /api/masters/bank-stores
pub async fn request_bank_store(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<BankStoreRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id =
        master_repo::insert_bank_store_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        BANK_STORE,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Vendor store mappings
// ============================================================

/// Handler for GET /api/masters/store-mappings
pub async fn list_mappings(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<StoreMappingWithApproval>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    let mappings = master_repo::list_mappings(&pool).await?;
    let mut enriched = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        let approval_status =
            approval_repo::latest_status_for_entity(&pool, STORE_MAPPING, mapping.mapping_id)
                .await?;
        enriched.push(StoreMappingWithApproval {
            mapping,
            approval_status,
        });
    }
    Ok(Json(enriched))
}

/// Handler for POST /api/masters/store-mappings
pub async fn request_mapping(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<StoreMappingRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id = master_repo::insert_mapping_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        STORE_MAPPING,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub reason: String,
}

/// Handler for POST /api/masters/store-mappings/{mapping_id}/deactivate-request
pub async fn request_mapping_deactivation(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Path(mapping_id): Path<i64>,
    Json(request): Json<DeactivateRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    if request.reason.trim().is_empty() {
        return Err(ApiError::bad_request("Reason is required"));
    }

    let mut tx = pool.begin().await?;
    let original = master_repo::snapshot_json(&mut tx, MasterKind::StoreMapping, mapping_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Store mapping not found"))?;
    let proposed = serde_json::json!({ "action": "DEACTIVATE" }).to_string();
    let approval_id = approvals::submit(
        &mut tx,
        STORE_MAPPING,
        Some(mapping_id),
        &original,
        &proposed,
        Some(&request.reason),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id: mapping_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Charge configuration
// ============================================================

/// Handler for GET /api/masters/charge-configs
pub async fn list_charge_configs(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<ChargeConfigRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_charge_configs(&pool).await?))
}

/// Handler for POST /api/masters/charge-configs
pub async fn request_charge_config(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<ChargeConfigRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id =
        master_repo::insert_charge_config_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        CHARGE_CONFIG,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Pickup rules
// ============================================================

/// Handler for GET /api/masters/pickup-rules
pub async fn list_pickup_rules(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<PickupRuleRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_pickup_rules(&pool).await?))
}

/// Handler for POST /api/masters/pickup-rules
pub async fn request_pickup_rule(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<PickupRuleRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    if request.pickup_type != "BEAT" && request.pickup_type != "CALL" {
        return Err(ApiError::bad_request("pickup_type must be BEAT or CALL"));
    }
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id =
        master_repo::insert_pickup_rule_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        PICKUP_RULE,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Vendor charges
// ============================================================

/// Handler for GET /api/masters/vendor-charges
pub async fn list_vendor_charges(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<VendorChargeRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_vendor_charges(&pool).await?))
}

/// Handler for POST /api/masters/vendor-charges
pub async fn request_vendor_charge(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<VendorChargeRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    if request.pickup_type != "BEAT" && request.pickup_type != "CALL" {
        return Err(ApiError::bad_request("pickup_type must be BEAT or CALL"));
    }
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id =
        master_repo::insert_vendor_charge_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        VENDOR_CHARGE,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Customer charge slabs
// ============================================================

/// Handler for GET /api/masters/customer-slabs
pub async fn list_customer_slabs(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<CustomerSlabRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_slabs(&pool).await?))
}

/// Handler for POST /api/masters/customer-slabs
pub async fn request_customer_slab(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<CustomerSlabRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    if request.amount_from > request.amount_to {
        return Err(ApiError::bad_request("amount_from must not exceed amount_to"));
    }
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id = master_repo::insert_slab_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        CUSTOMER_CHARGE_SLAB,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Waivers
// ============================================================

/// Handler for GET /api/masters/waivers
pub async fn list_waivers(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<WaiverRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_waivers(&pool).await?))
}

/// Handler for POST /api/masters/waivers
pub async fn request_waiver(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<WaiverRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    match request.waiver_type.as_str() {
        "PERCENT" | "CAP" | "BOTH" => {}
        other => {
            return Err(ApiError::bad_request(format!(
                "Unknown waiver type: {other}"
            )))
        }
    }
    ensure_month_open(&pool, &MonthKey::from_date(request.waiver_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id = master_repo::insert_waiver_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        WAIVER,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}

// ============================================================
// Vendor file formats
// ============================================================

/// Handler for GET /api/masters/file-formats
pub async fn list_file_formats(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
) -> Result<Json<Vec<FileFormatRow>>, ApiError> {
    actor.require_roles(&ALL_ROLES)?;
    Ok(Json(master_repo::list_file_formats(&pool).await?))
}

/// Handler for POST /api/masters/file-formats
///
/// The header mapping must decode into a usable column mapping before it is
/// allowed anywhere near the upload pipeline.
pub async fn request_file_format(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<FileFormatRequest>,
) -> Result<Json<MasterChangeResponse>, ApiError> {
    actor.require_roles(&[Role::Maker, Role::Admin])?;
    if let Err(e) = serde_json::from_value::<crate::services::canonical::VendorFormatMapping>(
        request.header_mapping.clone(),
    ) {
        return Err(ApiError::bad_request(format!("Invalid header mapping: {e}")));
    }
    ensure_month_open(&pool, &MonthKey::from_date(request.effective_from)).await?;
    let proposed = proposed_json(&request, "ACTIVATE")?;

    let mut tx = pool.begin().await?;
    let entity_id =
        master_repo::insert_file_format_candidate(&mut tx, &request, &actor.employee_id).await?;
    let approval_id = approvals::submit(
        &mut tx,
        VENDOR_FILE_FORMAT,
        Some(entity_id),
        "{}",
        &proposed,
        request.reason.as_deref(),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MasterChangeResponse {
        entity_id,
        approval_id,
        status: "PENDING".to_string(),
    }))
}
