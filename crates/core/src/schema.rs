//! Stage config schema
//!
//! A config record describes its fields through a static [`FieldDecl`]
//! table, normally generated by `#[derive(StageConfig)]`. [`Schema::build`]
//! turns that table into an ordered list of [`FieldDescriptor`]s, rejecting
//! declaration defects before any input is read.
//!
//! Tag format: `"key"` or `"key,required"`.

use std::collections::HashSet;
use std::fmt;

use serde_json::{json, Map, Value};

use crate::{Error, Result};

const REQUIRED_MODIFIER: &str = "required";

/// Value kind a config field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 string, empty when unset
    String,
    /// Boolean flag
    Boolean,
}

impl FieldKind {
    /// JSON Schema type name
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// Kind of a field as declared on the record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredKind {
    /// `String` field
    String,
    /// `bool` field
    Boolean,
    /// Any other type, carrying its name for diagnostics
    Unsupported(&'static str),
}

/// Static declaration of one record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    /// Rust field name, used to address the field on the record
    pub field: &'static str,
    /// Raw `#[config]` tag, empty when absent
    pub tag: &'static str,
    /// Declared value kind
    pub kind: DeclaredKind,
}

/// A typed field value moving in or out of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// String value
    String(String),
    /// Boolean value
    Bool(bool),
}

impl FieldValue {
    /// Kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Bool(_) => FieldKind::Boolean,
        }
    }

    /// String content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            FieldValue::Bool(_) => None,
        }
    }

    /// Boolean content, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::String(_) => None,
        }
    }
}

/// A stage configuration record
///
/// Implemented by `#[derive(StageConfig)]`. Hand-written impls must keep
/// `field_decls` in declaration order and address fields by their Rust name.
pub trait StageConfig {
    /// Field declarations in declaration order
    fn field_decls() -> &'static [FieldDecl];

    /// Current value of a field, `None` if the record cannot address it
    fn field(&self, field: &str) -> Option<FieldValue>;

    /// Store a value into a field; returns false if the field cannot hold it
    fn set_field(&mut self, field: &str, value: FieldValue) -> bool;
}

/// Resolved description of one config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Flag name and payload key
    pub key: String,
    /// Rust field name on the record
    pub field: &'static str,
    /// Value kind
    pub kind: FieldKind,
    /// Must be non-empty after resolution (never true for booleans)
    pub required: bool,
}

/// Ordered field descriptors of a config record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Build the schema of a record.
    ///
    /// Checks, per field in declaration order: supported kind, addressability,
    /// tag syntax, boolean-required and duplicate keys.
    pub fn build<C: StageConfig>(record: &C) -> Result<Self> {
        let mut fields = Vec::with_capacity(C::field_decls().len());
        let mut seen = HashSet::new();

        for decl in C::field_decls() {
            let kind = match decl.kind {
                DeclaredKind::String => FieldKind::String,
                DeclaredKind::Boolean => FieldKind::Boolean,
                DeclaredKind::Unsupported(type_name) => {
                    return Err(Error::UnsupportedKind {
                        field: decl.field.to_string(),
                        type_name: type_name.to_string(),
                    })
                }
            };

            match record.field(decl.field) {
                Some(value) if value.kind() == kind => {}
                _ => {
                    return Err(Error::NotAddressable {
                        field: decl.field.to_string(),
                    })
                }
            }

            let (key, required) = parse_tag(decl)?;

            if required && kind == FieldKind::Boolean {
                return Err(invalid(decl, "boolean fields cannot be required"));
            }
            if !seen.insert(key) {
                return Err(invalid(decl, "key is declared by more than one field"));
            }

            fields.push(FieldDescriptor {
                key: key.to_string(),
                field: decl.field,
                kind,
                required,
            });
        }

        Ok(Self { fields })
    }

    /// Descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Iterate descriptors in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    /// Look up a descriptor by key
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Required keys in declaration order
    pub fn required_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
            .collect()
    }

    /// JSON Schema describing the `current` object this record accepts
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.key.clone(), json!({ "type": f.kind.json_type() })))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_keys(),
        })
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn invalid(decl: &FieldDecl, reason: &'static str) -> Error {
    Error::InvalidDescriptor {
        field: decl.field.to_string(),
        tag: decl.tag.to_string(),
        reason,
    }
}

/// Split a tag into its key and required marker
fn parse_tag(decl: &FieldDecl) -> Result<(&'static str, bool)> {
    let tag = decl.tag;
    if tag.is_empty() {
        return Err(Error::MissingKey {
            field: decl.field.to_string(),
        });
    }

    let parts: Vec<&'static str> = tag.split(',').collect();
    let (key, required) = match parts.as_slice() {
        [key] => (*key, false),
        [key, modifier] if *modifier == REQUIRED_MODIFIER => (*key, true),
        [_, _] => return Err(invalid(decl, "only 'required' is a config option")),
        _ => {
            return Err(invalid(
                decl,
                "a config tag can only have a key and an optional required marker",
            ))
        }
    };

    if key.is_empty() {
        return Err(Error::MissingKey {
            field: decl.field.to_string(),
        });
    }
    if key.starts_with('-') || key.contains('=') {
        return Err(invalid(decl, "key cannot start with '-' or contain '='"));
    }

    Ok((key, required))
}
