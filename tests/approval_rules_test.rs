//! Maker-checker decision rules and comment history.

use dsb_backoffice::services::approvals::{
    append_history, check_decision, init_history, master_kind_for, ApprovalError, CommentEntry,
};

#[test]
fn checker_must_supply_a_comment() {
    assert!(matches!(
        check_decision("m-100", "c-200", "c-200", ""),
        Err(ApprovalError::CommentRequired)
    ));
    assert!(matches!(
        check_decision("m-100", "c-200", "c-200", "   "),
        Err(ApprovalError::CommentRequired)
    ));
}

#[test]
fn acting_user_must_match_the_named_checker() {
    assert!(matches!(
        check_decision("m-100", "c-200", "c-999", "looks fine"),
        Err(ApprovalError::CheckerMismatch)
    ));
}

#[test]
fn maker_can_never_decide_their_own_request() {
    assert!(matches!(
        check_decision("m-100", "m-100", "m-100", "self approve"),
        Err(ApprovalError::MakerCannotApprove)
    ));
}

#[test]
fn four_eyes_decision_passes() {
    assert!(check_decision("m-100", "c-200", "c-200", "verified against file").is_ok());
}

#[test]
fn history_records_the_full_conversation() {
    let h = init_history("MAKER", "m-100", "new vendor onboarding");
    let h = append_history(Some(&h), "CHECKER", "c-200", "which agreement covers this?");
    let h = append_history(Some(&h), "MAKER", "m-100", "agreement 2025/44, attached");
    let h = append_history(Some(&h), "CHECKER", "c-200", "approved");

    let entries: Vec<CommentEntry> = serde_json::from_str(&h).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].role, "MAKER");
    assert_eq!(entries[1].comment, "which agreement covers this?");
    assert_eq!(entries[3].user_id, "c-200");
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn history_tolerates_absent_or_broken_state() {
    let from_none: Vec<CommentEntry> =
        serde_json::from_str(&append_history(None, "CHECKER", "c-200", "hi")).unwrap();
    assert_eq!(from_none.len(), 1);

    let from_garbage: Vec<CommentEntry> =
        serde_json::from_str(&append_history(Some("{broken"), "CHECKER", "c-200", "hi")).unwrap();
    assert_eq!(from_garbage.len(), 1);
}

#[test]
fn all_master_entity_tags_resolve_to_a_kind() {
    for tag in [
        "VENDOR_MASTER",
        "BANK_STORE",
        "STORE_MAPPING",
        "CHARGE_CONFIG",
        "PICKUP_RULE",
        "VENDOR_CHARGE",
        "CUSTOMER_CHARGE_SLAB",
        "WAIVER",
        "VENDOR_FILE_FORMAT",
    ] {
        assert!(master_kind_for(tag).is_some(), "{tag} should map to a master");
    }
    assert!(master_kind_for("REMITTANCE").is_none());
    assert!(master_kind_for("RECONCILIATION_CORRECTION").is_none());
}
