//! The tagged result contract of the dispatch pipeline.
//!
//! The remote service answers with different JSON shapes per endpoint
//! family (object for entity lookups, array for lists and searches, a
//! `rows` wrapper for the explorer). [`Document`] models that explicitly,
//! so callers get a static guarantee about shape per family instead of
//! discovering it at runtime.

use serde_json::Value;

use crate::{Result, RoshanError};

/// A single structured record, as returned by entity lookups.
pub type Record = serde_json::Map<String, Value>;

/// Normalized result of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// One entity record.
    Record(Record),
    /// An ordered sequence of records; empty is a valid result.
    Records(Vec<Value>),
    /// Row-shaped explorer results.
    Rows(Vec<Value>),
}

impl Document {
    /// Unwrap an entity record.
    pub fn into_record(self) -> Result<Record> {
        match self {
            Self::Record(map) => Ok(map),
            other => Err(RoshanError::Data(format!(
                "expected a single record, got {}",
                other.kind()
            ))),
        }
    }

    /// Unwrap a record sequence.
    pub fn into_records(self) -> Result<Vec<Value>> {
        match self {
            Self::Records(items) => Ok(items),
            other => Err(RoshanError::Data(format!(
                "expected a record list, got {}",
                other.kind()
            ))),
        }
    }

    /// Unwrap explorer rows.
    pub fn into_rows(self) -> Result<Vec<Value>> {
        match self {
            Self::Rows(rows) => Ok(rows),
            other => Err(RoshanError::Data(format!(
                "expected query rows, got {}",
                other.kind()
            ))),
        }
    }

    /// The raw JSON view of this document, as persisted in the cache.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Record(map) => Value::Object(map.clone()),
            Self::Records(items) | Self::Rows(items) => Value::Array(items.clone()),
        }
    }

    /// Consume the document into its raw JSON view.
    pub fn into_value(self) -> Value {
        match self {
            Self::Record(map) => Value::Object(map),
            Self::Records(items) | Self::Rows(items) => Value::Array(items),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Record(_) => "a single record",
            Self::Records(_) => "a record list",
            Self::Rows(_) => "query rows",
        }
    }
}
