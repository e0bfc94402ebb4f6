//! Flat record representation for snapshot documents
//!
//! A snapshot record is a map of scalar fields plus foreign-key id fields.
//! Flatness is a hard compatibility contract: a nested object would make
//! the generic upsert path reject the record, so `FieldValue` deliberately
//! has no object variant and list fields only admit scalar elements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::TableDef;

/// Separator for composite natural keys. Key parts never contain this
/// character in practice; a collision would only merge two records of the
/// same table into one upsert target.
pub const KEY_SEPARATOR: char = ':';

/// A single field of a flat record. Arrays of scalars (tags, weekday masks)
/// are permitted; objects and arrays of objects are not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a stable key part, if it is key material
    pub fn as_key_part(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Int(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A value is flat when it is a scalar or a list of scalars
    pub fn is_flat(&self) -> bool {
        match self {
            FieldValue::List(items) => items.iter().all(|v| !matches!(v, FieldValue::List(_))),
            _ => true,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One flat record: field name to scalar value. Ordered so serialized
/// snapshots are byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every field must be a scalar or a list of scalars
    pub fn is_flat(&self) -> bool {
        self.fields.values().all(FieldValue::is_flat)
    }

    /// Extract the record's stable natural identity per the table's declared
    /// key fields. Missing or non-key-material fields make the record
    /// un-upsertable.
    pub fn natural_key(&self, table: &TableDef) -> Result<String, String> {
        let mut parts = Vec::with_capacity(table.key_fields.len());
        for key_field in &table.key_fields {
            let part = self
                .fields
                .get(key_field)
                .and_then(FieldValue::as_key_part)
                .ok_or_else(|| {
                    format!(
                        "record in '{}' has no usable key field '{}'",
                        table.name, key_field
                    )
                })?;
            parts.push(part);
        }
        Ok(parts.join(&KEY_SEPARATOR.to_string()))
    }

    /// Best-effort identity for error logs when key extraction itself failed
    pub fn describe(&self, table: &TableDef) -> String {
        match self.natural_key(table) {
            Ok(key) => key,
            Err(_) => self
                .get_str("id")
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<unidentified>".to_string()),
        }
    }
}

impl fmt::Display for FlatRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s)", self.fields.len())
    }
}

impl FromIterator<(String, FieldValue)> for FlatRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
