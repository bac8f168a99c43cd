//! Record representation shared by the resolver and its collaborators.
//!
//! A record is an untyped row: a map from column name to JSON value. The
//! resolver only ever reads integer columns from it (identifiers and parent
//! pointers), so values may arrive either as JSON numbers or as numeric
//! strings, which is how most SQL drivers hand rows back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Integer record identifier. Valid identifiers are positive.
pub type RecordId = i64;

/// Target language identifier (non-negative).
pub type LanguageId = u32;

/// A single row read from the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON value. Returns `None` unless the value is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Record { fields }),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Read a column as an integer.
    ///
    /// Accepts JSON integers and strings holding an integer; anything else
    /// (null, floats, booleans, non-numeric text) reads as `None`.
    pub fn int(&self, field: &str) -> Option<i64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Identity of a record: (table name, identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub table: String,
    pub id: RecordId,
}

impl RecordKey {
    pub fn new(table: impl Into<String>, id: RecordId) -> Self {
        RecordKey {
            table: table.into(),
            id,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.id)
    }
}
