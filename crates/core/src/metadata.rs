//! Object metadata attributes
//!
//! Stored pipeline outputs are tagged with the schema, table and field layout
//! they belong to, as a flat string map suitable for user-defined object
//! metadata:
//!
//! | key                      | value                               |
//! |--------------------------|-------------------------------------|
//! | `x-amz-meta-schema-name` | schema name                         |
//! | `x-amz-meta-table-name`  | table name                          |
//! | `x-amz-meta-field-names` | comma-joined field names            |
//! | `x-amz-meta-field-types` | comma-joined field types (parallel) |

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema name attribute key
pub const SCHEMA_NAME_KEY: &str = "x-amz-meta-schema-name";
/// Table name attribute key
pub const TABLE_NAME_KEY: &str = "x-amz-meta-table-name";
/// Field names attribute key
pub const FIELD_NAMES_KEY: &str = "x-amz-meta-field-names";
/// Field types attribute key
pub const FIELD_TYPES_KEY: &str = "x-amz-meta-field-types";

const SEPARATOR: char = ',';

/// Flat attribute map
pub type Attributes = BTreeMap<String, String>;

/// Metadata encoding/decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// A required attribute is absent or empty
    #[error("invalid metadata config: {0} is empty")]
    Empty(&'static str),

    /// Name and type lists have different lengths
    #[error("field configuration mismatch. names: {names}, types: {types}")]
    Mismatch {
        /// Comma-joined names
        names: String,
        /// Comma-joined types
        types: String,
    },

    /// Field name is empty or contains the list separator
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Field name appears more than once
    #[error("duplicate field name: {0:?}")]
    DuplicateFieldName(String),

    /// Type name outside the supported vocabulary
    #[error("unsupported data type detected: {0}")]
    UnsupportedType(String),
}

/// Column types a tagged object can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `mongo_id`, a 24-character object id
    MongoId,
    /// `string`
    String,
    /// `timestamp`
    Timestamp,
}

impl FieldType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::MongoId => "mongo_id",
            FieldType::String => "string",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Warehouse column type
    pub fn column_type(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::MongoId => "char(24)",
            FieldType::String => "varchar(256)",
            FieldType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(FieldType::Boolean),
            "integer" => Ok(FieldType::Integer),
            "mongo_id" => Ok(FieldType::MongoId),
            "string" => Ok(FieldType::String),
            "timestamp" => Ok(FieldType::Timestamp),
            other => Err(MetadataError::UnsupportedType(other.to_string())),
        }
    }
}

/// One warehouse column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column type, e.g. `varchar(256)`
    pub column_type: String,
}

/// Table layout derived from object metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Target schema
    pub schema: String,
    /// Target table
    pub table: String,
    /// Columns in field order
    pub columns: Vec<Column>,
}

/// Schema, table and field layout of a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Schema name
    pub schema_name: String,
    /// Table name
    pub table_name: String,
    /// Fields in column order
    pub fields: Vec<(String, FieldType)>,
}

impl ObjectMetadata {
    /// Create metadata from its parts
    pub fn new(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, FieldType)>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            fields: fields.into_iter().collect(),
        }
    }

    /// Check that every attribute would be present and non-empty
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.schema_name.is_empty() {
            return Err(MetadataError::Empty("schema"));
        }
        if self.table_name.is_empty() {
            return Err(MetadataError::Empty("table name"));
        }
        if self.fields.is_empty() {
            return Err(MetadataError::Empty("field names"));
        }
        if let Some((name, _)) = self
            .fields
            .iter()
            .find(|(name, _)| name.is_empty() || name.contains(SEPARATOR))
        {
            return Err(MetadataError::InvalidFieldName(name.clone()));
        }
        let mut seen = HashSet::new();
        for (name, _) in &self.fields {
            if !seen.insert(name.as_str()) {
                return Err(MetadataError::DuplicateFieldName(name.clone()));
            }
        }
        Ok(())
    }

    fn joined_names(&self) -> String {
        self.fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn joined_types(&self) -> String {
        self.fields
            .iter()
            .map(|(_, kind)| kind.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Encode as a flat attribute map
    pub fn to_attributes(&self) -> Result<Attributes, MetadataError> {
        self.validate()?;

        let mut attributes = Attributes::new();
        attributes.insert(SCHEMA_NAME_KEY.to_string(), self.schema_name.clone());
        attributes.insert(TABLE_NAME_KEY.to_string(), self.table_name.clone());
        attributes.insert(FIELD_NAMES_KEY.to_string(), self.joined_names());
        attributes.insert(FIELD_TYPES_KEY.to_string(), self.joined_types());
        Ok(attributes)
    }

    /// Decode from a flat attribute map; unrelated keys are ignored.
    ///
    /// The decoded fields pass the same checks as [`Self::validate`], so a
    /// decoded value always re-encodes.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, MetadataError> {
        let get = |key: &str, what: &'static str| {
            attributes
                .get(key)
                .filter(|v| !v.is_empty())
                .ok_or(MetadataError::Empty(what))
        };

        let schema_name = get(SCHEMA_NAME_KEY, "schema")?;
        let table_name = get(TABLE_NAME_KEY, "table name")?;
        let names = get(FIELD_NAMES_KEY, "field names")?;
        let types = get(FIELD_TYPES_KEY, "field types")?;

        let name_list: Vec<&str> = names.split(SEPARATOR).collect();
        let type_list: Vec<&str> = types.split(SEPARATOR).collect();
        if name_list.len() != type_list.len() {
            return Err(MetadataError::Mismatch {
                names: names.clone(),
                types: types.clone(),
            });
        }

        let fields = name_list
            .into_iter()
            .zip(type_list)
            .map(|(name, kind)| kind.parse::<FieldType>().map(|kind| (name.to_string(), kind)))
            .collect::<Result<Vec<_>, MetadataError>>()?;

        let metadata = Self {
            schema_name: schema_name.clone(),
            table_name: table_name.clone(),
            fields,
        };
        metadata.validate()?;
        Ok(metadata)
    }

    /// Project into a warehouse table layout
    pub fn to_table_config(&self) -> Result<TableConfig, MetadataError> {
        self.validate()?;

        Ok(TableConfig {
            schema: self.schema_name.clone(),
            table: self.table_name.clone(),
            columns: self
                .fields
                .iter()
                .map(|(name, kind)| Column {
                    name: name.clone(),
                    column_type: kind.column_type().to_string(),
                })
                .collect(),
        })
    }
}

/// Build the attribute map for a schema, table and field list
pub fn generate_attributes(
    schema: &str,
    table: &str,
    fields: impl IntoIterator<Item = (String, FieldType)>,
) -> Result<Attributes, MetadataError> {
    ObjectMetadata::new(schema, table, fields).to_attributes()
}
