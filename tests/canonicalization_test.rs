//! File canonicalization scenarios covering both upload surfaces.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

use dsb_backoffice::services::canonical::{
    classify_ledger_row, classify_vendor_row, parse_amount, parse_date, VendorFormatMapping,
    MISSING_FIELDS,
};

fn full_ledger_row() -> serde_json::Value {
    json!({
        "SOL_ID": "2043",
        "FORACID": "204300100012345",
        "ACCT_NAME": "M/S KIRANA STORES",
        "CUST_ID": "CIF0091",
        "STORE_CODE": "BLR-014",
        "LOCATION": "Bengaluru",
        "COLLN_AMT": "184250.00",
        "TRAN_DATE": "2025-06-03",
        "TRAN_ID": "S74112",
        "TRAN_TYPE": "C"
    })
}

fn vendor_mapping() -> VendorFormatMapping {
    serde_json::from_value(json!({
        "pickup_date_column": "PICKUP_DT",
        "pickup_amount_column": "AMT_COLLECTED",
        "vendor_store_code_column": "SITE_CODE",
        "pickup_type_column": "SERVICE",
        "account_no_column": "ACC_NO",
        "customer_id_column": "CUSTOMER",
        "remittance_amount_column": "DEPOSIT_AMT",
        "remittance_date_column": "DEPOSIT_DT"
    }))
    .unwrap()
}

#[test]
fn ledger_row_round_trips_all_fields() {
    let data = classify_ledger_row(&full_ledger_row()).unwrap();
    assert_eq!(data.sol_id, "2043");
    assert_eq!(data.store_code, "BLR-014");
    assert_eq!(data.colln_amt, Decimal::from_str("184250.00").unwrap());
    assert_eq!(data.tran_date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
}

#[test]
fn every_missing_ledger_field_quarantines_the_row() {
    let base = full_ledger_row();
    for key in [
        "SOL_ID", "FORACID", "ACCT_NAME", "CUST_ID", "STORE_CODE", "LOCATION", "COLLN_AMT",
        "TRAN_DATE", "TRAN_ID", "TRAN_TYPE",
    ] {
        let mut row = base.clone();
        row.as_object_mut().unwrap().remove(key);
        assert_eq!(classify_ledger_row(&row), Err(MISSING_FIELDS), "dropped {key}");
    }
}

#[test]
fn unparseable_ledger_date_quarantines_the_row() {
    let mut row = full_ledger_row();
    row["TRAN_DATE"] = json!("03.06.2025");
    assert_eq!(classify_ledger_row(&row), Err(MISSING_FIELDS));
}

#[test]
fn vendor_row_with_full_mapping() {
    let row = json!({
        "SITE_CODE": "MX-551",
        "PICKUP_DT": "03/06/2025",
        "AMT_COLLECTED": "184,250.00",
        "SERVICE": "CALL PICKUP",
        "ACC_NO": "99881234",
        "CUSTOMER": "CIF0091",
        "DEPOSIT_AMT": 184250.0,
        "DEPOSIT_DT": "04/06/2025"
    });
    let data = classify_vendor_row(&row, &vendor_mapping()).unwrap();
    assert_eq!(data.vendor_store_code, "MX-551");
    assert_eq!(data.pickup_type.as_deref(), Some("CALL"));
    assert_eq!(data.pickup_date, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
    assert_eq!(data.remittance_date, NaiveDate::from_ymd_opt(2025, 6, 4));
    assert_eq!(data.customer_id.as_deref(), Some("CIF0091"));
}

#[test]
fn vendor_row_without_service_cell_has_no_pickup_type() {
    let row = json!({
        "SITE_CODE": "MX-551",
        "PICKUP_DT": "2025-06-03",
        "AMT_COLLECTED": 500
    });
    let data = classify_vendor_row(&row, &vendor_mapping()).unwrap();
    assert_eq!(data.pickup_type, None);
    assert_eq!(data.remittance_amount, None);
}

#[test]
fn vendor_row_with_non_call_service_is_beat() {
    let row = json!({
        "SITE_CODE": "MX-551",
        "PICKUP_DT": "2025-06-03",
        "AMT_COLLECTED": 500,
        "SERVICE": "Daily Beat"
    });
    let data = classify_vendor_row(&row, &vendor_mapping()).unwrap();
    assert_eq!(data.pickup_type.as_deref(), Some("BEAT"));
}

#[test]
fn vendor_row_missing_any_mandatory_cell_is_quarantined() {
    let mapping = vendor_mapping();
    for missing in [
        json!({ "PICKUP_DT": "2025-06-03", "AMT_COLLECTED": 500 }),
        json!({ "SITE_CODE": "MX-551", "AMT_COLLECTED": 500 }),
        json!({ "SITE_CODE": "MX-551", "PICKUP_DT": "2025-06-03" }),
    ] {
        assert_eq!(classify_vendor_row(&missing, &mapping), Err(MISSING_FIELDS));
    }
}

#[test]
fn dates_with_time_components_parse() {
    assert_eq!(
        parse_date("2025-06-03 00:00:00"),
        NaiveDate::from_ymd_opt(2025, 6, 3)
    );
    assert_eq!(
        parse_date("03-06-2025 23:59"),
        NaiveDate::from_ymd_opt(2025, 6, 3)
    );
}

#[test]
fn amounts_parse_from_varied_cell_shapes() {
    assert_eq!(parse_amount(&json!(0)), Some(Decimal::ZERO));
    assert_eq!(
        parse_amount(&json!("12,345.67")),
        Decimal::from_str("12345.67").ok()
    );
    assert_eq!(parse_amount(&json!(true)), None);
}
