//! Administrative Cleanup API Routes
//!
//! POST /api/admin/cleanup wipes a named slice of operational data. Meant
//! for test and staging resets; the caller must restate the confirmation
//! phrase and give a reason, both of which are audited. The audit log
//! itself is never deleted.

use axum::{extract::State, Json};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::{Actor, Role};
use crate::contracts::admin_v1::{CleanupRequest, CleanupResponse};
use crate::repos::audit_repo;
use crate::routes::error::ApiError;

const CONFIRM_PHRASE: &str = "CONFIRM";

const UPLOAD_TABLES: &[&str] = &[
    "remittance_entries",
    "canonical_transactions",
    "ledger_invalid_records",
    "ledger_raw_staging",
    "vendor_invalid_records",
    "vendor_raw_staging",
    "ledger_upload_batch",
    "vendor_upload_batch",
];

const TRANSACTION_TABLES: &[&str] = &["remittance_entries", "canonical_transactions"];

const RECONCILIATION_TABLES: &[&str] = &[
    "exception_records",
    "reconciliation_corrections",
    "reconciliation_results",
    "vendor_charge_summary",
    "customer_charge_summary",
];

const APPROVAL_TABLES: &[&str] = &["reconciliation_corrections", "approval_requests"];

const VENDOR_STORE_TABLES: &[&str] = &[
    "vendor_store_mapping_master",
    "bank_store_master",
];

const MASTER_TABLES: &[&str] = &[
    "charge_configuration_master",
    "pickup_rules_master",
    "vendor_charge_master",
    "customer_charge_slabs",
    "waiver_master",
    "vendor_file_format_config",
];

/// ALL wipes everything in foreign-key order, masters last.
const ALL_TABLES: &[&str] = &[
    "remittance_entries",
    "canonical_transactions",
    "exception_records",
    "reconciliation_corrections",
    "reconciliation_results",
    "vendor_charge_summary",
    "customer_charge_summary",
    "approval_requests",
    "ledger_invalid_records",
    "ledger_raw_staging",
    "vendor_invalid_records",
    "vendor_raw_staging",
    "ledger_upload_batch",
    "vendor_upload_batch",
    "vendor_store_mapping_master",
    "vendor_file_format_config",
    "vendor_charge_master",
    "customer_charge_slabs",
    "waiver_master",
    "pickup_rules_master",
    "charge_configuration_master",
    "bank_store_master",
    "month_lock",
    "vendor_master",
];

fn tables_for(target: &str) -> Option<&'static [&'static str]> {
    match target {
        "UPLOADS" => Some(UPLOAD_TABLES),
        "TRANSACTIONS" => Some(TRANSACTION_TABLES),
        "RECONCILIATION" => Some(RECONCILIATION_TABLES),
        "APPROVALS" => Some(APPROVAL_TABLES),
        "VENDORS_STORES" => Some(VENDOR_STORE_TABLES),
        "MASTERS" => Some(MASTER_TABLES),
        "ALL" => Some(ALL_TABLES),
        _ => None,
    }
}

async fn wipe(
    tx: &mut Transaction<'_, Postgres>,
    tables: &[&str],
) -> Result<BTreeMap<String, u64>, sqlx::Error> {
    let mut deleted = BTreeMap::new();
    for table in tables {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut **tx)
            .await?;
        deleted.insert(table.to_string(), result.rows_affected());
    }
    Ok(deleted)
}

/// Handler for POST /api/admin/cleanup
pub async fn cleanup(
    State(pool): State<Arc<PgPool>>,
    actor: Actor,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<CleanupResponse>, ApiError> {
    actor.require_roles(&[Role::Admin])?;

    if request.confirm_text != CONFIRM_PHRASE {
        return Err(ApiError::bad_request(format!(
            "confirm_text must be \"{CONFIRM_PHRASE}\""
        )));
    }
    if request.reason.trim().is_empty() {
        return Err(ApiError::bad_request("Reason is required"));
    }
    let tables = tables_for(&request.target)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown cleanup target: {}", request.target)))?;

    let mut tx = pool.begin().await?;
    let deleted = wipe(&mut tx, tables).await?;
    audit_repo::log(
        &mut tx,
        "ADMIN_CLEANUP",
        None,
        "CLEANUP",
        None,
        Some(&format!(
            r#"{{"target":"{}","reason":"{}"}}"#,
            request.target, request.reason
        )),
        &actor.employee_id,
    )
    .await?;
    tx.commit().await?;

    tracing::warn!(target = %request.target, by = %actor.employee_id, "administrative cleanup executed");

    Ok(Json(CleanupResponse {
        target: request.target,
        deleted,
    }))
}
