//! JSON-level view over a repository, independent of its record type.

use crate::error::{ModelError, ModelResult};
use crate::record::{ChangeSink, Record};
use crate::repository::Repository;
use lendstack_types::{EntityKind, RecordId, Timestamps};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fields a caller may not set through a JSON body.
const SERVER_OWNED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Object-safe access to any [`Repository`].
///
/// The sync layer reads snapshots through this trait; the HTTP surface
/// performs CRUD with JSON bodies through it.
pub trait EntityRepository: Send + Sync {
    fn kind(&self) -> EntityKind;

    fn count(&self) -> usize;

    /// JSON form of every record, in list order.
    fn snapshot(&self) -> ModelResult<Vec<Value>>;

    fn find_json(&self, id: RecordId) -> ModelResult<Value>;

    /// Creates a record from a JSON object. Server-owned fields are ignored.
    fn create_json(&self, body: Value) -> ModelResult<Value>;

    /// Overlays the top-level fields of `patch` onto the record.
    fn update_json(&self, id: RecordId, patch: Value) -> ModelResult<Value>;

    fn remove_json(&self, id: RecordId) -> ModelResult<Value>;

    fn flush(&self) -> ModelResult<()>;

    fn set_sink(&self, sink: Arc<dyn ChangeSink>);
}

impl<T: Record> EntityRepository for Repository<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn count(&self) -> usize {
        Repository::count(self)
    }

    fn snapshot(&self) -> ModelResult<Vec<Value>> {
        self.find_all()
            .iter()
            .map(|record| serde_json::to_value(record).map_err(ModelError::from))
            .collect()
    }

    fn find_json(&self, id: RecordId) -> ModelResult<Value> {
        Ok(serde_json::to_value(self.get(id)?)?)
    }

    fn create_json(&self, body: Value) -> ModelResult<Value> {
        let mut object = into_object(body)?;
        strip_server_owned(&mut object);

        let placeholder = serde_json::to_value(Timestamps::now())?;
        if let Value::Object(stamps) = placeholder {
            object.extend(stamps);
        }
        object.insert("id".to_string(), Value::from(0u64));

        let draft: T = serde_json::from_value(Value::Object(object))
            .map_err(|e| ModelError::InvalidPayload(format!("{}: {e}", T::KIND)))?;
        Ok(serde_json::to_value(self.create(draft)?)?)
    }

    fn update_json(&self, id: RecordId, patch: Value) -> ModelResult<Value> {
        let mut patch = into_object(patch)?;
        strip_server_owned(&mut patch);

        let current = serde_json::to_value(self.get(id)?)?;
        let mut merged = into_object(current)?;
        merged.extend(patch);
        let replacement: T = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ModelError::InvalidPayload(format!("{}: {e}", T::KIND)))?;

        let updated = self.update(id, move |record| *record = replacement)?;
        Ok(serde_json::to_value(updated)?)
    }

    fn remove_json(&self, id: RecordId) -> ModelResult<Value> {
        Ok(serde_json::to_value(self.remove(id)?)?)
    }

    fn flush(&self) -> ModelResult<()> {
        Repository::flush(self)
    }

    fn set_sink(&self, sink: Arc<dyn ChangeSink>) {
        Repository::set_sink(self, sink);
    }
}

fn into_object(value: Value) -> ModelResult<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ModelError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn strip_server_owned(object: &mut Map<String, Value>) {
    for field in SERVER_OWNED_FIELDS {
        object.remove(*field);
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
