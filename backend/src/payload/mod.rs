//! Import payload loading.
//!
//! The payload is the JSON produced by the spreadsheet export: one key per
//! sheet, each holding raw records. Only the top-level shape is checked here
//! (object root, arrays where arrays are expected, an object for `banks`);
//! the records themselves stay untyped until the schemas parse them. The
//! warehouse is left to its schema.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ImportError, ImportResult};

/// UTF-8 byte order mark, written by some spreadsheet exporters.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Raw import payload. Missing or `null` keys default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[serde(default, deserialize_with = "null_as_empty", alias = "ventas")]
    pub sales: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_empty", alias = "clientes")]
    pub clients: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_empty", alias = "ordenesCompra", alias = "ordenes")]
    pub purchase_orders: Vec<Value>,

    /// Banks keyed by name.
    #[serde(default, deserialize_with = "null_as_empty", alias = "bancos")]
    pub banks: BTreeMap<String, Value>,

    #[serde(default, alias = "almacen")]
    pub warehouse: Option<Value>,

    /// Passed through unvalidated.
    #[serde(default, deserialize_with = "null_as_empty", alias = "distribuidores")]
    pub distributors: Vec<Value>,
}

impl ImportPayload {
    /// Build a payload from an already parsed JSON value.
    pub fn from_value(value: Value) -> ImportResult<Self> {
        if !value.is_object() {
            return Err(ImportError::NotAnObject(json_type(&value).to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Total number of raw records across all collections.
    pub fn record_count(&self) -> usize {
        self.sales.len()
            + self.clients.len()
            + self.purchase_orders.len()
            + self.banks.len()
            + self.distributors.len()
    }
}

/// Load a payload from a JSON file.
pub fn load_payload_file<P: AsRef<Path>>(path: P) -> ImportResult<ImportPayload> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_payload_bytes(&bytes)
}

/// Parse a payload from raw bytes, ignoring a leading UTF-8 BOM.
pub fn parse_payload_bytes(bytes: &[u8]) -> ImportResult<ImportPayload> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let value: Value = serde_json::from_slice(bytes)?;
    ImportPayload::from_value(value)
}

/// Exporters write `null` for an empty sheet.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
