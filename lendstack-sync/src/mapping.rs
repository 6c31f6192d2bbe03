//! Local record JSON to remote row.

use crate::error::{SyncError, SyncResult};
use lendstack_types::{EntityKind, RecordId};
use serde_json::{Map, Value};

/// Fields that stay local for each entity type.
fn local_only_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Staff => &["password"],
        _ => &[],
    }
}

/// Maps a record's camelCase JSON onto the mirror's snake_case columns.
///
/// Only top-level keys are renamed; nested values are passed through. The
/// record must carry a non-negative integer `id`.
pub fn to_remote_row(kind: EntityKind, record: &Value) -> SyncResult<(RecordId, Value)> {
    let object = record
        .as_object()
        .ok_or_else(|| SyncError::Mapping(format!("{kind} record is not a JSON object")))?;
    let id = RecordId::from_json(record)
        .ok_or_else(|| SyncError::Mapping(format!("{kind} record has no integer id")))?;

    let skipped = local_only_fields(kind);
    let row: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !skipped.contains(&key.as_str()))
        .map(|(key, value)| (camel_to_snake(key), value.clone()))
        .collect();

    Ok((id, Value::Object(row)))
}

/// `loanAmount` → `loan_amount`. Already-snake keys are unchanged.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
