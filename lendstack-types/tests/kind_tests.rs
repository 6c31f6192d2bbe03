use lendstack_types::{EntityKind, Error};
use proptest::prelude::*;
use std::str::FromStr;

// ── Derived names ─────────────────────────────────────────────────

#[test]
fn singular_names() {
    assert_eq!(EntityKind::Enquiry.as_str(), "enquiry");
    assert_eq!(EntityKind::Document.as_str(), "document");
    assert_eq!(EntityKind::Staff.as_str(), "staff");
    assert_eq!(EntityKind::Transaction.as_str(), "transaction");
    assert_eq!(EntityKind::Notification.as_str(), "notification");
}

#[test]
fn storage_keys_are_plural_file_stems() {
    assert_eq!(EntityKind::Enquiry.storage_key(), "enquiries");
    assert_eq!(EntityKind::Staff.storage_key(), "staff");
    assert_eq!(EntityKind::Transaction.storage_key(), "transactions");
}

#[test]
fn remote_table_matches_storage_key() {
    for kind in EntityKind::ALL {
        assert_eq!(kind.remote_table(), kind.storage_key());
    }
}

#[test]
fn storage_keys_are_unique() {
    let mut keys: Vec<_> = EntityKind::ALL.iter().map(|k| k.storage_key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), EntityKind::ALL.len());
}

// ── Parsing ───────────────────────────────────────────────────────

#[test]
fn parse_singular_and_plural() {
    assert_eq!(EntityKind::from_str("enquiry").unwrap(), EntityKind::Enquiry);
    assert_eq!(EntityKind::from_str("enquiries").unwrap(), EntityKind::Enquiry);
    assert_eq!(EntityKind::from_str("Documents").unwrap(), EntityKind::Document);
    assert_eq!(EntityKind::from_str(" STAFF ").unwrap(), EntityKind::Staff);
}

#[test]
fn parse_unknown_kind() {
    let err = EntityKind::from_str("loans").unwrap_err();
    assert!(matches!(err, Error::UnknownEntityKind(ref s) if s == "loans"));
    assert!(err.to_string().contains("loans"));
}

#[test]
fn display_matches_as_str() {
    for kind in EntityKind::ALL {
        assert_eq!(kind.to_string(), kind.as_str());
    }
}

#[test]
fn serde_uses_lowercase_names() {
    let json = serde_json::to_string(&EntityKind::Transaction).unwrap();
    assert_eq!(json, "\"transaction\"");
    let parsed: EntityKind = serde_json::from_str("\"notification\"").unwrap();
    assert_eq!(parsed, EntityKind::Notification);
}

proptest! {
    /// Display output always parses back to the same kind.
    #[test]
    fn display_parse_roundtrip(idx in 0usize..EntityKind::ALL.len()) {
        let kind = EntityKind::ALL[idx];
        prop_assert_eq!(EntityKind::from_str(&kind.to_string()).unwrap(), kind);
    }
}
