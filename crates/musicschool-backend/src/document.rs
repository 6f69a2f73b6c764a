//! Document model and the [`DocumentStore`] trait.
//!
//! A document is a JSON object addressed by `(collection, id)`. Collections
//! are plain path strings, so a sub-collection is just a longer path such as
//! `study_groups/group1/messages`.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BackendError, Result};
use crate::query::Query;

/// Key of the placeholder object replaced by the commit instant.
const SERVER_TIMESTAMP_KEY: &str = "$serverTimestamp";

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    /// Decode the fields into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.fields.clone())?)
    }
}

/// Remote document database.
///
/// Every call may fail with [`BackendError::Unavailable`]; callers are
/// expected to log and degrade rather than retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create or fully overwrite a document. Server timestamp placeholders
    /// are resolved and the stored document is returned.
    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<Document>;

    /// Run a filtered/ordered query over one collection.
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;
}

/// Field value replaced by the store with its commit instant.
pub fn server_timestamp() -> Value {
    let mut placeholder = Map::new();
    placeholder.insert(SERVER_TIMESTAMP_KEY.to_string(), Value::Bool(true));
    Value::Object(placeholder)
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .map(|o| o.len() == 1 && o.get(SERVER_TIMESTAMP_KEY) == Some(&Value::Bool(true)))
        .unwrap_or(false)
}

/// Serialize `model` and mark `field` to be filled with the commit instant.
pub fn encode_with_server_timestamp<T: Serialize>(model: &T, field: &str) -> Result<Value> {
    let mut value = serde_json::to_value(model)?;
    let object = as_object_mut(&mut value)?;
    object.insert(field.to_string(), server_timestamp());
    Ok(value)
}

/// Replace every top-level placeholder with `now` (RFC 3339, millis, `Z`).
pub fn resolve_server_timestamps(fields: &mut Value, now: DateTime<Utc>) -> Result<()> {
    let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true));
    for value in as_object_mut(fields)?.values_mut() {
        if is_server_timestamp(value) {
            *value = stamp.clone();
        }
    }
    Ok(())
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>> {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    value
        .as_object_mut()
        .ok_or_else(|| BackendError::InvalidDocument(format!("expected an object, got {kind}")))
}

/// Fetch and decode one document.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<T>> {
    match store.get(collection, id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Run a query and decode every hit. Documents that fail to decode are
/// skipped with a warning, like a mapping step that drops malformed rows.
pub async fn query_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    query: &Query,
) -> Result<Vec<T>> {
    let docs = store.query(query).await?;
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.decode::<T>() {
            Ok(model) => out.push(model),
            Err(e) => {
                tracing::warn!(
                    collection = %query.collection,
                    id = %doc.id,
                    error = %e,
                    "Skipping document that failed to decode"
                );
            }
        }
    }
    Ok(out)
}

/// Hands out strictly increasing commit instants so that documents written
/// in the same millisecond still order by write sequence.
#[derive(Debug, Default)]
pub struct CommitClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl CommitClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> DateTime<Utc> {
        let now = truncate_to_millis(Utc::now());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stamp = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

fn truncate_to_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap_or(t)
}
