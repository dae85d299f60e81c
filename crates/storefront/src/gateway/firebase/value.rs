//! Firestore typed-value codec.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type:
//!
//! ```json
//! {"name": {"stringValue": "Termo"}, "soldUnits": {"integerValue": "3"}}
//! ```
//!
//! These helpers convert between that form and plain JSON field maps.

use serde_json::{Map, Number, Value};

use crate::gateway::{Fields, GatewayError};

/// Encode plain fields as Firestore typed fields.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Encode one plain JSON value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    let mut typed = Map::with_capacity(1);
    match value {
        Value::Null => {
            typed.insert("nullValue".to_string(), Value::Null);
        }
        Value::Bool(b) => {
            typed.insert("booleanValue".to_string(), Value::Bool(*b));
        }
        Value::Number(n) => {
            // Integers travel as strings to keep 64-bit precision.
            if let Some(i) = n.as_i64() {
                typed.insert("integerValue".to_string(), Value::String(i.to_string()));
            } else if let Some(u) = n.as_u64() {
                typed.insert("integerValue".to_string(), Value::String(u.to_string()));
            } else {
                typed.insert("doubleValue".to_string(), Value::Number(n.clone()));
            }
        }
        Value::String(s) => {
            typed.insert("stringValue".to_string(), Value::String(s.clone()));
        }
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect();
            let mut array = Map::with_capacity(1);
            array.insert("values".to_string(), Value::Array(values));
            typed.insert("arrayValue".to_string(), Value::Object(array));
        }
        Value::Object(fields) => {
            let mut map = Map::with_capacity(1);
            map.insert("fields".to_string(), Value::Object(encode_fields(fields)));
            typed.insert("mapValue".to_string(), Value::Object(map));
        }
    }
    Value::Object(typed)
}

/// Decode Firestore typed fields into plain fields.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] naming the first field that is not a
/// recognised typed value.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, GatewayError> {
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|plain| (key.clone(), plain))
                .map_err(|e| GatewayError::Decode(format!("field {key}: {e}")))
        })
        .collect()
}

/// Decode one typed value.
///
/// Timestamps, references and bytes decode to their string form; geo points
/// decode to `{"latitude", "longitude"}`.
///
/// # Errors
///
/// Returns a description of the problem if the value is not recognised.
pub fn decode_value(value: &Value) -> Result<Value, String> {
    let Some(typed) = value.as_object() else {
        return Err(format!("expected a typed value, got {value}"));
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Err("empty typed value".to_string());
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("booleanValue is not a bool: {inner}")),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("{kind} is not a string: {inner}")),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                Some(other) => return Err(format!("arrayValue.values is not an array: {other}")),
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields).map_err(|e| e.to_string())?,
                Some(other) => return Err(format!("mapValue.fields is not an object: {other}")),
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(format!("unknown value type {other}")),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, String> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| format!("integerValue {s:?}: {e}")),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
        other => Err(format!("integerValue is not an integer: {other}")),
    }
}

fn decode_double(inner: &Value) -> Result<Value, String> {
    let parsed = match inner {
        Value::Number(n) => n.as_f64(),
        // NaN and Infinity arrive as strings.
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    let Some(f) = parsed else {
        return Err(format!("doubleValue is not a number: {inner}"));
    };
    Ok(Number::from_f64(f).map_or(Value::Null, Value::Number))
}
