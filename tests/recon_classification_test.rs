//! Reconciliation classification scenarios.

use rust_decimal::Decimal;
use std::str::FromStr;

use dsb_backoffice::services::approvals::correction_outcome;
use dsb_backoffice::services::recon::{
    classify, AMOUNT_MISMATCH, MATCHED, MISSING_FINACLE, MISSING_VENDOR,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn matched_when_both_sides_agree_exactly() {
    assert_eq!(classify(Some(dec("12500.50")), Some(dec("12500.50"))), (MATCHED, None));
}

#[test]
fn scale_differences_do_not_break_matching() {
    assert_eq!(classify(Some(dec("300")), Some(dec("300.00"))), (MATCHED, None));
}

#[test]
fn smallest_difference_is_still_a_mismatch() {
    let (status, reason) = classify(Some(dec("12500.50")), Some(dec("12500.51")));
    assert_eq!(status, AMOUNT_MISMATCH);
    assert_eq!(reason, Some("Amount mismatch"));
}

#[test]
fn vendor_only_store_is_missing_from_the_ledger() {
    let (status, _) = classify(Some(dec("900")), None);
    assert_eq!(status, MISSING_FINACLE);
}

#[test]
fn ledger_only_store_is_missing_from_the_vendor_file() {
    let (status, _) = classify(None, Some(dec("900")));
    assert_eq!(status, MISSING_VENDOR);
}

#[test]
fn approved_correction_with_equal_amounts_resolves_the_pair() {
    let amount = dec("4200.00");
    assert_eq!(correction_outcome(Some(amount), Some(amount)), ("MATCHED", None));
}

#[test]
fn approved_correction_that_still_differs_keeps_the_mismatch() {
    let (status, reason) = correction_outcome(Some(dec("4200")), Some(dec("4300")));
    assert_eq!(status, "AMOUNT_MISMATCH");
    assert_eq!(reason, Some("Amount mismatch after correction"));
}

#[test]
fn correction_with_a_missing_side_is_a_mismatch() {
    let (status, _) = correction_outcome(Some(dec("4200")), None);
    assert_eq!(status, "AMOUNT_MISMATCH");
}
