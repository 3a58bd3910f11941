//! Stage payloads
//!
//! A payload carries the values for the stage about to run (`current`) and
//! the queue of work items for later stages (`remaining`):
//!
//! ```json
//! { "current": {"district_id": "abc123"}, "remaining": [{"district_id": "abc456"}] }
//! ```
//!
//! Older callers pass the bare field object without the envelope
//! (`{"district_id": "abc123"}`); [`decode_payload`] accepts both.

use std::io::Write;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{FieldKind, FieldValue, Schema, StageConfig};
use crate::{Error, Result};

/// JSON object keyed by config key
pub type FieldMap = Map<String, Value>;

/// Standard payload handed from one stage to the next
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Values for the stage about to run
    #[serde(default)]
    pub current: FieldMap,
    /// Work items for later stages, in order
    #[serde(default)]
    pub remaining: Vec<FieldMap>,
}

impl Payload {
    /// Whether there is nothing left for a next stage
    pub fn is_exhausted(&self) -> bool {
        self.current.is_empty() && self.remaining.is_empty()
    }

    /// Single-line JSON encoding
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the payload as one JSON line
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Print a payload to stdout as one JSON line
pub fn print_payload(payload: &Payload) -> Result<()> {
    payload.write_to(std::io::stdout().lock())
}

/// Envelope as it appears on the wire; both members may be absent or null
#[derive(Debug, Default, Deserialize)]
struct WirePayload {
    #[serde(default)]
    current: Option<FieldMap>,
    #[serde(default)]
    remaining: Option<Vec<FieldMap>>,
}

/// A decoded payload argument
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingPayload {
    /// Field source for this stage
    pub fields: FieldMap,
    /// Work queue for later stages
    pub remaining: Vec<FieldMap>,
    /// Whether the fields came from the flat pre-envelope shape
    pub legacy: bool,
}

/// Decode the first JSON value in `raw`; trailing text is ignored
fn decode_first<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let mut stream = serde_json::Deserializer::from_str(raw).into_iter::<T>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(Error::InvalidJson(e)),
        // whitespace only; let the strict decoder produce the EOF error
        None => serde_json::from_str::<T>(raw).map_err(Error::InvalidJson),
    }
}

/// Decode the first JSON value in `raw` as a top-level object.
///
/// `null` yields `None`. Arrays and scalars are rejected; a derived struct
/// would otherwise accept an array as a positional envelope.
fn decode_object(raw: &str) -> Result<Option<FieldMap>> {
    match decode_first::<Value>(raw)? {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(Error::InvalidJson(de::Error::custom(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        )))),
    }
}

/// Decode a payload argument in either the envelope or the legacy shape.
///
/// The legacy shape is used only when `current` is absent or null; an
/// empty `current` object is taken as-is.
pub fn decode_payload(raw: &str) -> Result<IncomingPayload> {
    let object = decode_object(raw)?.unwrap_or_default();
    let wire: WirePayload = serde_json::from_value(Value::Object(object.clone())).map_err(Error::InvalidJson)?;
    let remaining = wire.remaining.unwrap_or_default();

    match wire.current {
        Some(fields) => Ok(IncomingPayload {
            fields,
            remaining,
            legacy: false,
        }),
        None => {
            tracing::debug!("payload has no 'current' object, reading legacy flat shape");
            Ok(IncomingPayload {
                fields: object,
                remaining,
                legacy: true,
            })
        }
    }
}

/// Decode a bare field object (no envelope)
pub fn decode_flat(raw: &str) -> Result<FieldMap> {
    Ok(decode_object(raw)?.unwrap_or_default())
}

/// JSON type name used in type mismatch errors
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

/// Copy values for schema keys from `fields` into the record.
///
/// Keys not in the schema are ignored. Returns the number of fields set.
pub fn apply_fields<C: StageConfig>(schema: &Schema, fields: &FieldMap, record: &mut C) -> Result<usize> {
    let mut applied = 0;

    for descriptor in schema {
        let Some(raw) = fields.get(&descriptor.key) else {
            continue;
        };

        let value = match (descriptor.kind, raw) {
            (FieldKind::String, Value::String(s)) => FieldValue::String(s.clone()),
            (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Bool(*b),
            (expected, other) => {
                return Err(Error::TypeMismatch {
                    key: descriptor.key.clone(),
                    expected,
                    found: json_type_name(other),
                })
            }
        };

        if !record.set_field(descriptor.field, value) {
            return Err(Error::NotAddressable {
                field: descriptor.field.to_string(),
            });
        }
        applied += 1;
    }

    Ok(applied)
}
