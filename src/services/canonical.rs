//! Row canonicalization for ledger and vendor files.
//!
//! Files arrive as arrays of JSON objects keyed by header name. Ledger files
//! use a fixed header set; vendor files are decoded through the vendor's
//! active header mapping. A row that cannot be canonicalized is quarantined
//! with a reason rather than failing the batch.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

pub const MISSING_FIELDS: &str = "Missing required fields";

/// Fixed headers expected in a core-banking ledger extract.
pub const LEDGER_REQUIRED_HEADERS: [&str; 10] = [
    "SOL_ID",
    "FORACID",
    "ACCT_NAME",
    "CUST_ID",
    "STORE_CODE",
    "LOCATION",
    "COLLN_AMT",
    "TRAN_DATE",
    "TRAN_ID",
    "TRAN_TYPE",
];

/// Canonical form of one ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRowData {
    pub sol_id: String,
    pub foracid: String,
    pub acct_name: String,
    pub cust_id: String,
    pub store_code: String,
    pub location: String,
    pub colln_amt: Decimal,
    pub tran_date: NaiveDate,
    pub tran_id: String,
    pub tran_type: String,
}

/// Canonical form of one vendor pickup row.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorRowData {
    pub vendor_store_code: String,
    pub pickup_date: NaiveDate,
    pub pickup_amount: Decimal,
    pub pickup_type: Option<String>,
    pub account_no: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub remittance_amount: Option<Decimal>,
    pub remittance_date: Option<NaiveDate>,
}

/// A vendor's column mapping, stored as JSON on the file format master.
/// The three mandatory columns make deserialization fail for incomplete
/// mappings, which the upload path reports as an invalid format.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorFormatMapping {
    pub pickup_date_column: String,
    pub pickup_amount_column: String,
    pub vendor_store_code_column: String,
    #[serde(default)]
    pub pickup_type_column: Option<String>,
    #[serde(default)]
    pub account_no_column: Option<String>,
    #[serde(default)]
    pub customer_id_column: Option<String>,
    #[serde(default)]
    pub customer_name_column: Option<String>,
    #[serde(default)]
    pub remittance_amount_column: Option<String>,
    #[serde(default)]
    pub remittance_date_column: Option<String>,
}

/// Non-empty trimmed string cell.
fn cell(row: &Value, key: &str) -> Option<String> {
    let v = row.get(key)?;
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a date cell. Source files mix ISO and day-first forms, sometimes
/// with a time suffix; only the date part matters.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let date_part = if s.len() > 10 { &s[..10] } else { s };
    for fmt in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }
    None
}

/// Parse an amount cell. Accepts JSON numbers and strings; thousands
/// separators are tolerated.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                None
            } else {
                Decimal::from_str(&cleaned).ok()
            }
        }
        _ => None,
    }
}

fn date_cell(row: &Value, key: &str) -> Option<NaiveDate> {
    cell(row, key).and_then(|s| parse_date(&s))
}

fn amount_cell(row: &Value, key: &str) -> Option<Decimal> {
    row.get(key).and_then(parse_amount)
}

/// Pickup type derivation: a cell mentioning CALL means an on-call pickup,
/// any other value a scheduled beat. With no cell to read the type stays
/// unknown; the charge engine bills neither kind for such rows.
pub fn pickup_type_from(raw: Option<&str>) -> Option<String> {
    raw.map(|s| {
        if s.to_ascii_uppercase().contains("CALL") {
            "CALL".to_string()
        } else {
            "BEAT".to_string()
        }
    })
}

/// Canonicalize a ledger row, or give the quarantine reason.
pub fn classify_ledger_row(row: &Value) -> Result<LedgerRowData, &'static str> {
    let sol_id = cell(row, "SOL_ID");
    let foracid = cell(row, "FORACID");
    let acct_name = cell(row, "ACCT_NAME");
    let cust_id = cell(row, "CUST_ID");
    let store_code = cell(row, "STORE_CODE");
    let location = cell(row, "LOCATION");
    let colln_amt = amount_cell(row, "COLLN_AMT");
    let tran_date = date_cell(row, "TRAN_DATE");
    let tran_id = cell(row, "TRAN_ID");
    let tran_type = cell(row, "TRAN_TYPE");

    match (
        sol_id, foracid, acct_name, cust_id, store_code, location, colln_amt, tran_date, tran_id,
        tran_type,
    ) {
        (
            Some(sol_id),
            Some(foracid),
            Some(acct_name),
            Some(cust_id),
            Some(store_code),
            Some(location),
            Some(colln_amt),
            Some(tran_date),
            Some(tran_id),
            Some(tran_type),
        ) => Ok(LedgerRowData {
            sol_id,
            foracid,
            acct_name,
            cust_id,
            store_code,
            location,
            colln_amt,
            tran_date,
            tran_id,
            tran_type,
        }),
        _ => Err(MISSING_FIELDS),
    }
}

/// Canonicalize a vendor row through the vendor's header mapping.
pub fn classify_vendor_row(
    row: &Value,
    mapping: &VendorFormatMapping,
) -> Result<VendorRowData, &'static str> {
    let vendor_store_code = cell(row, &mapping.vendor_store_code_column);
    let pickup_date = date_cell(row, &mapping.pickup_date_column);
    let pickup_amount = amount_cell(row, &mapping.pickup_amount_column);

    let (vendor_store_code, pickup_date, pickup_amount) =
        match (vendor_store_code, pickup_date, pickup_amount) {
            (Some(c), Some(d), Some(a)) => (c, d, a),
            _ => return Err(MISSING_FIELDS),
        };

    let pickup_type_raw = mapping
        .pickup_type_column
        .as_deref()
        .and_then(|col| cell(row, col));
    let pickup_type = pickup_type_from(pickup_type_raw.as_deref());

    Ok(VendorRowData {
        vendor_store_code,
        pickup_date,
        pickup_amount,
        pickup_type,
        account_no: mapping.account_no_column.as_deref().and_then(|c| cell(row, c)),
        customer_id: mapping.customer_id_column.as_deref().and_then(|c| cell(row, c)),
        customer_name: mapping.customer_name_column.as_deref().and_then(|c| cell(row, c)),
        remittance_amount: mapping
            .remittance_amount_column
            .as_deref()
            .and_then(|c| amount_cell(row, c)),
        remittance_date: mapping
            .remittance_date_column
            .as_deref()
            .and_then(|c| date_cell(row, c)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping() -> VendorFormatMapping {
        serde_json::from_value(json!({
            "pickup_date_column": "Pickup Date",
            "pickup_amount_column": "Amount",
            "vendor_store_code_column": "Store",
            "pickup_type_column": "Type",
            "customer_id_column": "Cust"
        }))
        .unwrap()
    }

    #[test]
    fn parses_mixed_date_formats() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(parse_date("2025-03-07"), Some(d));
        assert_eq!(parse_date("07-03-2025"), Some(d));
        assert_eq!(parse_date("07/03/2025"), Some(d));
        assert_eq!(parse_date("2025-03-07 14:21:00"), Some(d));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn parses_amounts_from_numbers_and_strings() {
        assert_eq!(parse_amount(&json!(1500.25)), Decimal::from_str("1500.25").ok());
        assert_eq!(parse_amount(&json!("1,500.25")), Decimal::from_str("1500.25").ok());
        assert_eq!(parse_amount(&json!("  42 ")), Decimal::from_str("42").ok());
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[test]
    fn ledger_row_with_all_fields_canonicalizes() {
        let row = json!({
            "SOL_ID": "1001", "FORACID": "AC1", "ACCT_NAME": "Shop A",
            "CUST_ID": "C1", "STORE_CODE": "S001", "LOCATION": "Pune",
            "COLLN_AMT": "2500.00", "TRAN_DATE": "2025-02-10",
            "TRAN_ID": "T1", "TRAN_TYPE": "CR"
        });
        let data = classify_ledger_row(&row).unwrap();
        assert_eq!(data.store_code, "S001");
        assert_eq!(data.colln_amt, Decimal::from_str("2500.00").unwrap());
    }

    #[test]
    fn ledger_row_missing_field_is_quarantined() {
        let row = json!({
            "SOL_ID": "1001", "FORACID": "AC1", "ACCT_NAME": "Shop A",
            "CUST_ID": "C1", "STORE_CODE": "", "LOCATION": "Pune",
            "COLLN_AMT": "2500.00", "TRAN_DATE": "2025-02-10",
            "TRAN_ID": "T1", "TRAN_TYPE": "CR"
        });
        assert_eq!(classify_ledger_row(&row), Err(MISSING_FIELDS));
    }

    #[test]
    fn vendor_row_maps_through_header_mapping() {
        let row = json!({
            "Store": "V-22", "Pickup Date": "10-02-2025",
            "Amount": 1800, "Type": "On Call", "Cust": "C9"
        });
        let data = classify_vendor_row(&row, &mapping()).unwrap();
        assert_eq!(data.vendor_store_code, "V-22");
        assert_eq!(data.pickup_type.as_deref(), Some("CALL"));
        assert_eq!(data.customer_id.as_deref(), Some("C9"));
    }

    #[test]
    fn pickup_type_stays_unknown_without_a_cell() {
        assert_eq!(pickup_type_from(None), None);
        assert_eq!(pickup_type_from(Some("Scheduled")).as_deref(), Some("BEAT"));
        assert_eq!(pickup_type_from(Some("call pickup")).as_deref(), Some("CALL"));
    }

    #[test]
    fn vendor_row_without_type_column_keeps_type_unset() {
        let unmapped_type: VendorFormatMapping = serde_json::from_value(json!({
            "pickup_date_column": "Pickup Date",
            "pickup_amount_column": "Amount",
            "vendor_store_code_column": "Store"
        }))
        .unwrap();
        let row = json!({ "Store": "V-22", "Pickup Date": "10-02-2025", "Amount": 1800 });
        let data = classify_vendor_row(&row, &unmapped_type).unwrap();
        assert_eq!(data.pickup_type, None);
    }

    #[test]
    fn vendor_row_missing_pickup_date_is_quarantined() {
        let row = json!({ "Store": "V-22", "Amount": 1800 });
        assert_eq!(classify_vendor_row(&row, &mapping()), Err(MISSING_FIELDS));
    }

    #[test]
    fn mapping_without_required_column_fails_to_parse() {
        let bad: Result<VendorFormatMapping, _> =
            serde_json::from_value(json!({ "pickup_date_column": "D" }));
        assert!(bad.is_err());
    }
}
