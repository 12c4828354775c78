//! Charge computation math scenarios.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use dsb_backoffice::contracts::masters_v1::CustomerSlabRow;
use dsb_backoffice::services::charges::{
    enhancement_charge, gst_amount, percent_of, slab_charge, vendor_base_charge, waiver_amount,
    MissingRate,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn slab(vendor_id: i64, from: &str, to: &str, charge: &str) -> CustomerSlabRow {
    CustomerSlabRow {
        slab_id: 0,
        vendor_id,
        amount_from: dec(from),
        amount_to: dec(to),
        charge_amount: dec(charge),
        slab_label: None,
        status: "ACTIVE".to_string(),
        effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        effective_to: None,
    }
}

#[test]
fn vendor_month_with_beats_calls_and_enhancement() {
    // 20 beats at 30, 12 calls with 10 free at 50, 2.5 lakh picked up
    // against a 1 lakh threshold paying 75 per multiple.
    let base = vendor_base_charge(20, 12, 10, Some(dec("30")), Some(dec("50"))).unwrap();
    assert_eq!(base.beat_charge, dec("600"));
    assert_eq!(base.chargeable_calls, 2);
    assert_eq!(base.call_charge, dec("100"));

    let enhancement = enhancement_charge(dec("250000"), Some(dec("100000")), Some(dec("75")));
    assert_eq!(enhancement, dec("150"));

    let total = base.beat_charge + base.call_charge + enhancement;
    assert_eq!(total, dec("850"));

    let tax = gst_amount(total, Some("Y"), Some(dec("18")));
    assert_eq!(tax, dec("153.00"));
    assert_eq!(total + tax, dec("1003.00"));
}

#[test]
fn vendor_with_only_free_calls_needs_no_call_rate() {
    let base = vendor_base_charge(0, 10, 10, None, None).unwrap();
    assert_eq!(base.chargeable_calls, 0);
    assert_eq!(base.call_charge, Decimal::ZERO);
    assert_eq!(base.beat_charge, Decimal::ZERO);
}

#[test]
fn missing_rates_are_reported_per_pickup_type() {
    assert_eq!(
        vendor_base_charge(1, 0, 0, None, Some(dec("50"))),
        Err(MissingRate::Beat)
    );
    assert_eq!(
        vendor_base_charge(0, 1, 0, Some(dec("30")), None),
        Err(MissingRate::Call)
    );
}

#[test]
fn customer_charge_prefers_slab_over_percentage() {
    let slabs = vec![
        slab(1, "0", "10000", "100"),
        slab(1, "10000.01", "50000", "400"),
    ];
    let total = dec("25000");

    let base = match slab_charge(&slabs, total) {
        Some(charge) => charge,
        None => percent_of(total, dec("2")),
    };
    assert_eq!(base, dec("400"));

    // Out of slab range, the percentage fallback applies
    let big = dec("90000");
    let base = match slab_charge(&slabs, big) {
        Some(charge) => charge,
        None => percent_of(big, dec("2")),
    };
    assert_eq!(base, dec("1800.00"));
}

#[test]
fn waiver_variants_against_a_thousand_rupee_charge() {
    let charge = dec("1000");
    assert_eq!(waiver_amount("PERCENT", Some(dec("10")), None, charge), dec("100.00"));
    assert_eq!(waiver_amount("CAP", None, Some(dec("250")), charge), dec("250"));
    assert_eq!(
        waiver_amount("BOTH", Some(dec("10")), Some(dec("50")), charge),
        dec("50")
    );
    assert_eq!(
        waiver_amount("BOTH", Some(dec("3")), Some(dec("50")), charge),
        dec("30.00")
    );
}

#[test]
fn net_charge_never_goes_negative() {
    let gross = dec("80");
    let waiver = waiver_amount("CAP", None, Some(dec("500")), gross);
    let net = (gross - waiver).max(Decimal::ZERO);
    assert_eq!(net, Decimal::ZERO);
}

#[test]
fn enhancement_ignores_partial_multiples_and_missing_config() {
    assert_eq!(
        enhancement_charge(dec("199999.99"), Some(dec("100000")), Some(dec("75"))),
        dec("75")
    );
    assert_eq!(enhancement_charge(dec("500000"), None, None), Decimal::ZERO);
}
