//! Repository for versioned master data
//!
//! All masters share one lifecycle: candidate rows are inserted INACTIVE,
//! and approval activates them while closing out ACTIVE siblings that share
//! the natural key (effective_to = new effective_from - 1 day). The waiver
//! master keeps its interval in waiver_from/waiver_to instead of
//! effective_from/effective_to.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::contracts::masters_v1::{
    BankStoreRequest, BankStoreRow, ChargeConfigRequest, ChargeConfigRow, CustomerSlabRequest,
    CustomerSlabRow, FileFormatRequest, FileFormatRow, PickupRuleRequest, PickupRuleRow,
    StoreMappingRequest, StoreMappingRow, VendorChargeRequest, VendorChargeRow,
    VendorMasterRequest, VendorMasterRow, WaiverRequest, WaiverRow,
};

/// The master tables that flow through maker-checker activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterKind {
    Vendor,
    BankStore,
    StoreMapping,
    ChargeConfig,
    PickupRule,
    VendorCharge,
    CustomerSlab,
    Waiver,
    FileFormat,
}

impl MasterKind {
    pub fn table(&self) -> &'static str {
        match self {
            MasterKind::Vendor => "vendor_master",
            MasterKind::BankStore => "bank_store_master",
            MasterKind::StoreMapping => "vendor_store_mapping_master",
            MasterKind::ChargeConfig => "charge_configuration_master",
            MasterKind::PickupRule => "pickup_rules_master",
            MasterKind::VendorCharge => "vendor_charge_master",
            MasterKind::CustomerSlab => "customer_charge_slabs",
            MasterKind::Waiver => "waiver_master",
            MasterKind::FileFormat => "vendor_file_format_config",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            MasterKind::Vendor => "vendor_id",
            MasterKind::BankStore => "store_id",
            MasterKind::StoreMapping => "mapping_id",
            MasterKind::ChargeConfig => "config_id",
            MasterKind::PickupRule => "rule_id",
            MasterKind::VendorCharge => "vendor_charge_id",
            MasterKind::CustomerSlab => "slab_id",
            MasterKind::Waiver => "waiver_id",
            MasterKind::FileFormat => "format_id",
        }
    }

    /// SQL predicate matching siblings that share the natural key.
    /// `t` is the sibling row, `n` the newly approved row.
    fn natural_key_match(&self) -> &'static str {
        match self {
            MasterKind::Vendor => "t.vendor_code = n.vendor_code",
            MasterKind::BankStore => "t.bank_store_code = n.bank_store_code",
            MasterKind::StoreMapping => {
                "t.vendor_id = n.vendor_id AND t.vendor_store_code = n.vendor_store_code"
            }
            MasterKind::ChargeConfig => "t.config_code = n.config_code",
            MasterKind::PickupRule => "t.pickup_type = n.pickup_type",
            MasterKind::VendorCharge => {
                "t.vendor_id = n.vendor_id AND t.pickup_type = n.pickup_type"
            }
            MasterKind::CustomerSlab => {
                "t.vendor_id = n.vendor_id AND t.amount_from = n.amount_from AND t.amount_to = n.amount_to"
            }
            MasterKind::Waiver => "t.customer_id = n.customer_id",
            MasterKind::FileFormat => "t.vendor_id = n.vendor_id",
        }
    }

    fn interval_columns(&self) -> (&'static str, &'static str) {
        match self {
            MasterKind::Waiver => ("waiver_from", "waiver_to"),
            _ => ("effective_from", "effective_to"),
        }
    }
}

/// Activate a candidate row and close out ACTIVE siblings sharing the
/// natural key. Runs inside the approval transaction.
pub async fn activate(
    tx: &mut Transaction<'_, Postgres>,
    kind: MasterKind,
    entity_id: i64,
    checker_id: &str,
) -> Result<(), sqlx::Error> {
    let table = kind.table();
    let id_col = kind.id_column();
    let (from_col, to_col) = kind.interval_columns();

    let close_siblings = format!(
        "UPDATE {table} t SET status = 'INACTIVE', {to_col} = n.{from_col} - 1 \
         FROM {table} n \
         WHERE n.{id_col} = $1 AND t.{id_col} <> $1 AND t.status = 'ACTIVE' AND {key}",
        key = kind.natural_key_match(),
    );
    sqlx::query(&close_siblings).bind(entity_id).execute(&mut **tx).await?;

    let activate_row = format!(
        "UPDATE {table} SET status = 'ACTIVE', approved_by = $2, approved_date = NOW() \
         WHERE {id_col} = $1"
    );
    sqlx::query(&activate_row)
        .bind(entity_id)
        .bind(checker_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Retire a row (DEACTIVATE action approved by checker). The interval is
/// closed as of today.
pub async fn deactivate(
    tx: &mut Transaction<'_, Postgres>,
    kind: MasterKind,
    entity_id: i64,
    checker_id: &str,
) -> Result<(), sqlx::Error> {
    let (_, to_col) = kind.interval_columns();
    let sql = format!(
        "UPDATE {table} SET status = 'INACTIVE', {to_col} = CURRENT_DATE, \
         approved_by = $2, approved_date = NOW() WHERE {id_col} = $1",
        table = kind.table(),
        id_col = kind.id_column(),
    );
    sqlx::query(&sql)
        .bind(entity_id)
        .bind(checker_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Snapshot a master row as JSON for the approval audit payloads.
pub async fn snapshot_json(
    tx: &mut Transaction<'_, Postgres>,
    kind: MasterKind,
    entity_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let sql = format!(
        "SELECT row_to_json(t)::text FROM {table} t WHERE {id_col} = $1",
        table = kind.table(),
        id_col = kind.id_column(),
    );
    sqlx::query_scalar::<_, String>(&sql)
        .bind(entity_id)
        .fetch_optional(&mut **tx)
        .await
}

// ============================================================
// Candidate inserts (all rows start INACTIVE)
// ============================================================

pub async fn insert_vendor_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &VendorMasterRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_master (vendor_code, vendor_name, status, effective_from, created_by)
        VALUES ($1, $2, 'INACTIVE', $3, $4)
        RETURNING vendor_id
        "#,
    )
    .bind(&req.vendor_code)
    .bind(&req.vendor_name)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_bank_store_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &BankStoreRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bank_store_master
            (bank_store_code, store_name, sol_id, location, frequency, daily_pickup_limit,
             deposition_branch, deposition_branch_name, fixed_charge, status, effective_from, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'INACTIVE', $10, $11)
        RETURNING store_id
        "#,
    )
    .bind(&req.bank_store_code)
    .bind(&req.store_name)
    .bind(&req.sol_id)
    .bind(&req.location)
    .bind(&req.frequency)
    .bind(req.daily_pickup_limit)
    .bind(&req.deposition_branch)
    .bind(&req.deposition_branch_name)
    .bind(req.fixed_charge)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_mapping_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &StoreMappingRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_store_mapping_master
            (vendor_id, vendor_store_code, bank_store_code, customer_id, customer_name,
             account_no, status, effective_from, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, 'INACTIVE', $7, $8)
        RETURNING mapping_id
        "#,
    )
    .bind(req.vendor_id)
    .bind(&req.vendor_store_code)
    .bind(&req.bank_store_code)
    .bind(&req.customer_id)
    .bind(&req.customer_name)
    .bind(&req.account_no)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_charge_config_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &ChargeConfigRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO charge_configuration_master
            (config_code, config_name, value_number, value_text, value_date,
             unit_of_measure, status, effective_from, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, 'INACTIVE', $7, $8)
        RETURNING config_id
        "#,
    )
    .bind(&req.config_code)
    .bind(&req.config_name)
    .bind(req.value_number)
    .bind(&req.value_text)
    .bind(req.value_date)
    .bind(&req.unit_of_measure)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_pickup_rule_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &PickupRuleRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pickup_rules_master (pickup_type, free_limit, status, effective_from, created_by)
        VALUES ($1, $2, 'INACTIVE', $3, $4)
        RETURNING rule_id
        "#,
    )
    .bind(&req.pickup_type)
    .bind(req.free_limit)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_vendor_charge_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &VendorChargeRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_charge_master (vendor_id, pickup_type, base_charge, status, effective_from, created_by)
        VALUES ($1, $2, $3, 'INACTIVE', $4, $5)
        RETURNING vendor_charge_id
        "#,
    )
    .bind(req.vendor_id)
    .bind(&req.pickup_type)
    .bind(req.base_charge)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_slab_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &CustomerSlabRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO customer_charge_slabs
            (vendor_id, amount_from, amount_to, charge_amount, slab_label, status, effective_from, created_by)
        VALUES ($1, $2, $3, $4, $5, 'INACTIVE', $6, $7)
        RETURNING slab_id
        "#,
    )
    .bind(req.vendor_id)
    .bind(req.amount_from)
    .bind(req.amount_to)
    .bind(req.charge_amount)
    .bind(&req.slab_label)
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_waiver_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &WaiverRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO waiver_master
            (customer_id, waiver_type, waiver_percentage, waiver_cap_amount,
             waiver_from, waiver_to, status, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, 'INACTIVE', $7)
        RETURNING waiver_id
        "#,
    )
    .bind(&req.customer_id)
    .bind(&req.waiver_type)
    .bind(req.waiver_percentage)
    .bind(req.waiver_cap_amount)
    .bind(req.waiver_from)
    .bind(req.waiver_to)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn insert_file_format_candidate(
    tx: &mut Transaction<'_, Postgres>,
    req: &FileFormatRequest,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO vendor_file_format_config
            (vendor_id, format_name, header_mapping_json, status, effective_from, created_by)
        VALUES ($1, $2, $3, 'INACTIVE', $4, $5)
        RETURNING format_id
        "#,
    )
    .bind(req.vendor_id)
    .bind(&req.format_name)
    .bind(req.header_mapping.to_string())
    .bind(req.effective_from)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

// ============================================================
// Active lookups used by the pipelines
// ============================================================

pub async fn active_vendor_by_code(
    pool: &PgPool,
    vendor_code: &str,
) -> Result<Option<VendorMasterRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorMasterRow>(
        r#"
        SELECT vendor_id, vendor_code, vendor_name, status, effective_from, effective_to,
               created_by, created_date, approved_by, approved_date
        FROM vendor_master
        WHERE vendor_code = $1 AND status = 'ACTIVE'
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(vendor_code)
    .fetch_optional(pool)
    .await
}

pub async fn active_vendors(pool: &PgPool) -> Result<Vec<VendorMasterRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorMasterRow>(
        r#"
        SELECT vendor_id, vendor_code, vendor_name, status, effective_from, effective_to,
               created_by, created_date, approved_by, approved_date
        FROM vendor_master
        WHERE status = 'ACTIVE'
        ORDER BY vendor_code
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Minimal mapping projection used by canonicalization and reconciliation.
#[derive(Debug, Clone, FromRow)]
pub struct MappingLookup {
    pub bank_store_code: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
}

/// Resolve the mapping for a vendor store code as of a date.
pub async fn find_mapping(
    pool: &PgPool,
    vendor_id: i64,
    vendor_store_code: &str,
    as_of: NaiveDate,
) -> Result<Option<MappingLookup>, sqlx::Error> {
    sqlx::query_as::<_, MappingLookup>(
        r#"
        SELECT bank_store_code, customer_id, customer_name
        FROM vendor_store_mapping_master
        WHERE vendor_id = $1
          AND vendor_store_code = $2
          AND status = 'ACTIVE'
          AND effective_from <= $3
          AND (effective_to IS NULL OR effective_to >= $3)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(vendor_id)
    .bind(vendor_store_code)
    .bind(as_of)
    .fetch_optional(pool)
    .await
}

/// Whether a mapping for this code ever existed, regardless of interval or
/// status. Distinguishes UNMAPPED from OUT_OF_RANGE in dry-run validation.
pub async fn mapping_exists_any(
    pool: &PgPool,
    vendor_id: i64,
    vendor_store_code: &str,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM vendor_store_mapping_master
        WHERE vendor_id = $1 AND vendor_store_code = $2
        "#,
    )
    .bind(vendor_id)
    .bind(vendor_store_code)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn active_file_format(
    pool: &PgPool,
    vendor_id: i64,
    as_of: NaiveDate,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT header_mapping_json
        FROM vendor_file_format_config
        WHERE vendor_id = $1
          AND status = 'ACTIVE'
          AND effective_from <= $2
          AND (effective_to IS NULL OR effective_to >= $2)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(vendor_id)
    .bind(as_of)
    .fetch_optional(pool)
    .await
}

pub async fn active_pickup_rule_free_limit(
    pool: &PgPool,
    pickup_type: &str,
    as_of: NaiveDate,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT free_limit
        FROM pickup_rules_master
        WHERE pickup_type = $1
          AND status = 'ACTIVE'
          AND effective_from <= $2
          AND (effective_to IS NULL OR effective_to >= $2)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(pickup_type)
    .bind(as_of)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}

pub async fn active_vendor_charge_rate(
    pool: &PgPool,
    vendor_id: i64,
    pickup_type: &str,
    as_of: NaiveDate,
) -> Result<Option<Decimal>, sqlx::Error> {
    sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT base_charge
        FROM vendor_charge_master
        WHERE vendor_id = $1
          AND pickup_type = $2
          AND status = 'ACTIVE'
          AND effective_from <= $3
          AND (effective_to IS NULL OR effective_to >= $3)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(vendor_id)
    .bind(pickup_type)
    .bind(as_of)
    .fetch_optional(pool)
    .await
}

pub async fn active_slabs(
    pool: &PgPool,
    vendor_id: i64,
    as_of: NaiveDate,
) -> Result<Vec<CustomerSlabRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerSlabRow>(
        r#"
        SELECT slab_id, vendor_id, amount_from, amount_to, charge_amount, slab_label,
               status, effective_from, effective_to
        FROM customer_charge_slabs
        WHERE vendor_id = $1
          AND status = 'ACTIVE'
          AND effective_from <= $2
          AND (effective_to IS NULL OR effective_to >= $2)
        ORDER BY amount_from
        "#,
    )
    .bind(vendor_id)
    .bind(as_of)
    .fetch_all(pool)
    .await
}

pub async fn active_waiver(
    pool: &PgPool,
    customer_id: &str,
    as_of: NaiveDate,
) -> Result<Option<WaiverRow>, sqlx::Error> {
    sqlx::query_as::<_, WaiverRow>(
        r#"
        SELECT waiver_id, customer_id, waiver_type, waiver_percentage, waiver_cap_amount,
               waiver_from, waiver_to, status
        FROM waiver_master
        WHERE customer_id = $1
          AND status = 'ACTIVE'
          AND waiver_from <= $2
          AND (waiver_to IS NULL OR waiver_to >= $2)
        ORDER BY waiver_from DESC
        LIMIT 1
        "#,
    )
    .bind(customer_id)
    .bind(as_of)
    .fetch_optional(pool)
    .await
}

/// Fall back to the mapping's customer identity when a vendor row carries a
/// store code but no customer id.
/// Customer behind a mapped store pair, as of a transaction's business date.
pub async fn mapping_customer_id(
    pool: &PgPool,
    vendor_id: i64,
    vendor_store_code: &str,
    bank_store_code: &str,
    as_of: NaiveDate,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>(
        r#"
        SELECT customer_id
        FROM vendor_store_mapping_master
        WHERE vendor_id = $1
          AND vendor_store_code = $2
          AND bank_store_code = $3
          AND status = 'ACTIVE'
          AND effective_from <= $4
          AND (effective_to IS NULL OR effective_to >= $4)
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(vendor_id)
    .bind(vendor_store_code)
    .bind(bank_store_code)
    .bind(as_of)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}

// ============================================================
// Listings
// ============================================================

pub async fn list_vendors(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<VendorMasterRow>, sqlx::Error> {
    let sql = if include_inactive {
        "SELECT vendor_id, vendor_code, vendor_name, status, effective_from, effective_to, \
         created_by, created_date, approved_by, approved_date \
         FROM vendor_master ORDER BY vendor_code, effective_from DESC"
    } else {
        "SELECT vendor_id, vendor_code, vendor_name, status, effective_from, effective_to, \
         created_by, created_date, approved_by, approved_date \
         FROM vendor_master WHERE status = 'ACTIVE' ORDER BY vendor_code"
    };
    sqlx::query_as::<_, VendorMasterRow>(sql).fetch_all(pool).await
}

pub async fn list_bank_stores(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<BankStoreRow>, sqlx::Error> {
    let sql = if include_inactive {
        "SELECT store_id, bank_store_code, store_name, sol_id, location, frequency, \
         daily_pickup_limit, deposition_branch, deposition_branch_name, fixed_charge, \
         status, effective_from, effective_to \
         FROM bank_store_master ORDER BY bank_store_code, effective_from DESC"
    } else {
        "SELECT store_id, bank_store_code, store_name, sol_id, location, frequency, \
         daily_pickup_limit, deposition_branch, deposition_branch_name, fixed_charge, \
         status, effective_from, effective_to \
         FROM bank_store_master WHERE status = 'ACTIVE' ORDER BY bank_store_code"
    };
    sqlx::query_as::<_, BankStoreRow>(sql).fetch_all(pool).await
}

pub async fn list_mappings(pool: &PgPool) -> Result<Vec<StoreMappingRow>, sqlx::Error> {
    sqlx::query_as::<_, StoreMappingRow>(
        r#"
        SELECT mapping_id, vendor_id, vendor_store_code, bank_store_code, customer_id,
               customer_name, account_no, status, effective_from, effective_to, created_by
        FROM vendor_store_mapping_master
        ORDER BY vendor_id, vendor_store_code, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_charge_configs(pool: &PgPool) -> Result<Vec<ChargeConfigRow>, sqlx::Error> {
    sqlx::query_as::<_, ChargeConfigRow>(
        r#"
        SELECT config_id, config_code, config_name, value_number, value_text, value_date,
               unit_of_measure, status, effective_from, effective_to
        FROM charge_configuration_master
        ORDER BY config_code, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_pickup_rules(pool: &PgPool) -> Result<Vec<PickupRuleRow>, sqlx::Error> {
    sqlx::query_as::<_, PickupRuleRow>(
        r#"
        SELECT rule_id, pickup_type, free_limit, status, effective_from, effective_to
        FROM pickup_rules_master
        ORDER BY pickup_type, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_vendor_charges(pool: &PgPool) -> Result<Vec<VendorChargeRow>, sqlx::Error> {
    sqlx::query_as::<_, VendorChargeRow>(
        r#"
        SELECT vendor_charge_id, vendor_id, pickup_type, base_charge, status,
               effective_from, effective_to
        FROM vendor_charge_master
        ORDER BY vendor_id, pickup_type, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_slabs(pool: &PgPool) -> Result<Vec<CustomerSlabRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerSlabRow>(
        r#"
        SELECT slab_id, vendor_id, amount_from, amount_to, charge_amount, slab_label,
               status, effective_from, effective_to
        FROM customer_charge_slabs
        ORDER BY vendor_id, amount_from, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_waivers(pool: &PgPool) -> Result<Vec<WaiverRow>, sqlx::Error> {
    sqlx::query_as::<_, WaiverRow>(
        r#"
        SELECT waiver_id, customer_id, waiver_type, waiver_percentage, waiver_cap_amount,
               waiver_from, waiver_to, status
        FROM waiver_master
        ORDER BY customer_id, waiver_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_file_formats(pool: &PgPool) -> Result<Vec<FileFormatRow>, sqlx::Error> {
    sqlx::query_as::<_, FileFormatRow>(
        r#"
        SELECT format_id, vendor_id, format_name, header_mapping_json, status,
               effective_from, effective_to
        FROM vendor_file_format_config
        ORDER BY vendor_id, effective_from DESC
        "#,
    )
    .fetch_all(pool)
    .await
}
