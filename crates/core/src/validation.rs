//! Required-field validation

use crate::schema::{FieldKind, FieldValue, Schema, StageConfig};
use crate::{Error, Result};

/// Keys of required string fields that are still empty, in declaration order
pub fn missing_required<C: StageConfig>(schema: &Schema, record: &C) -> Vec<String> {
    schema
        .iter()
        .filter(|d| d.required && d.kind == FieldKind::String)
        .filter(|d| match record.field(d.field) {
            Some(FieldValue::String(value)) => value.is_empty(),
            _ => true,
        })
        .map(|d| d.key.clone())
        .collect()
}

/// Fail with [`Error::MissingRequiredFields`] if any required field is empty
pub fn validate_required<C: StageConfig>(schema: &Schema, record: &C) -> Result<()> {
    let missing = missing_required(schema, record);
    if missing.is_empty() {
        Ok(())
    } else {
        tracing::warn!(missing = ?missing, "stage config is missing required fields");
        Err(Error::MissingRequiredFields(missing))
    }
}
