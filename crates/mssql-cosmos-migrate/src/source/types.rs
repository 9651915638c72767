//! Row and value types produced by the source adapter.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};

/// SQL value enum for type-safe row handling.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Decimal(rust_decimal::Decimal),
    DateTime(chrono::NaiveDateTime),
    DateTimeOffset(chrono::DateTime<chrono::FixedOffset>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
}

impl SqlValue {
    /// JSON representation used for the target document.
    ///
    /// Binary data is base64-encoded; decimals are rendered as strings to
    /// avoid silent precision loss through f64; temporal types use ISO-8601.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(v) => Value::Bool(*v),
            SqlValue::I16(v) => Value::from(*v),
            SqlValue::I32(v) => Value::from(*v),
            SqlValue::I64(v) => Value::from(*v),
            SqlValue::F32(v) => serde_json::Number::from_f64(*v as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::F64(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::String(v) => Value::String(v.clone()),
            SqlValue::Bytes(v) => Value::String(STANDARD.encode(v)),
            SqlValue::Uuid(v) => Value::String(v.to_string()),
            SqlValue::Decimal(v) => Value::String(v.to_string()),
            SqlValue::DateTime(v) => Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            SqlValue::DateTimeOffset(v) => Value::String(v.to_rfc3339()),
            SqlValue::Date(v) => Value::String(v.to_string()),
            SqlValue::Time(v) => Value::String(v.to_string()),
        }
    }

    /// Stable string form for use as a document id, if this value is a
    /// reasonable key type. Floats, blobs and NULL are not.
    pub fn to_key_string(&self) -> Option<String> {
        match self {
            SqlValue::I16(v) => Some(v.to_string()),
            SqlValue::I32(v) => Some(v.to_string()),
            SqlValue::I64(v) => Some(v.to_string()),
            SqlValue::String(v) => Some(v.clone()),
            SqlValue::Uuid(v) => Some(v.to_string()),
            SqlValue::Decimal(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

/// One row read from the source table: ordered column name/value pairs.
///
/// Immutable once read; ownership passes from the source adapter through the
/// driver to the sink for the duration of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

/// A row converted for the document store, plus the key it is filed under.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document id (stringified primary key).
    pub id: String,
    /// Primary-key value, kept for the post-write source delete.
    pub key: SqlValue,
    /// JSON body including the `id` field.
    pub body: Value,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Value of a named column.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    /// All columns in source order.
    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    /// Convert into a target document keyed by `pk_column`.
    ///
    /// The document's `id` is the stringified primary key so repeated
    /// upserts of the same row land on the same document. Any source column
    /// literally named `id` is overwritten by it. Returns `None` when the
    /// primary-key column is absent, NULL, or not a usable key type.
    pub fn into_document(self, pk_column: &str) -> Option<Document> {
        let key = self.get(pk_column)?.clone();
        let id = key.to_key_string()?;

        let mut body = Map::with_capacity(self.columns.len() + 1);
        for (name, value) in &self.columns {
            body.insert(name.clone(), value.to_json());
        }
        body.insert("id".to_string(), Value::String(id.clone()));

        Some(Document {
            id,
            key,
            body: Value::Object(body),
        })
    }
}
