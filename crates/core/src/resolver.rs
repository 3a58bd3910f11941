//! Input source resolution
//!
//! Registers one flag per schema field, parses the context's arguments and
//! decides where the stage's values come from. Explicit flags always win;
//! the first positional argument is only looked at when no flag was set.

use crate::flags::{FlagSet, ParseContext};
use crate::schema::{FieldKind, FieldValue, Schema, StageConfig};
use crate::{Error, Result};

/// Where a stage's values come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// At least one flag was explicitly provided; the record is populated
    Flags,
    /// No flags; the first positional argument holds a JSON payload
    Payload(String),
    /// Neither flags nor a payload; the record keeps its defaults
    Defaults,
}

/// Parse flags into the record and pick the input source.
///
/// String flags default to empty and count as provided when non-empty.
/// Boolean flags default to the record's current value, count as provided
/// when the parsed value differs, and are always written back.
pub fn resolve_source<C: StageConfig>(ctx: &mut ParseContext, schema: &Schema, record: &mut C) -> Result<Source> {
    let args = ctx.take_args()?;

    let mut flags = FlagSet::new();
    let mut bool_defaults = Vec::new();
    for descriptor in schema {
        match descriptor.kind {
            FieldKind::String => flags.define_string(&descriptor.key, "")?,
            FieldKind::Boolean => {
                let default = record
                    .field(descriptor.field)
                    .and_then(|v| v.as_bool())
                    .ok_or_else(|| Error::NotAddressable {
                        field: descriptor.field.to_string(),
                    })?;
                bool_defaults.push(default);
                flags.define_bool(&descriptor.key, default)?;
            }
        }
    }

    flags.parse(args)?;

    let mut flag_found = false;
    let mut defaults = bool_defaults.into_iter();
    for descriptor in schema {
        let value = match descriptor.kind {
            FieldKind::String => match flags.string(&descriptor.key) {
                Some(s) if !s.is_empty() => {
                    flag_found = true;
                    FieldValue::String(s.to_string())
                }
                _ => continue,
            },
            FieldKind::Boolean => {
                let parsed = flags.bool(&descriptor.key).unwrap_or_default();
                if Some(parsed) != defaults.next() {
                    flag_found = true;
                }
                FieldValue::Bool(parsed)
            }
        };

        if !record.set_field(descriptor.field, value) {
            return Err(Error::NotAddressable {
                field: descriptor.field.to_string(),
            });
        }
    }

    if flag_found {
        tracing::debug!("stage values provided by flags, skipping payload argument");
        return Ok(Source::Flags);
    }

    match flags.arg(0) {
        Some(raw) if !raw.is_empty() => {
            tracing::debug!("no flags set, reading payload argument");
            Ok(Source::Payload(raw.to_string()))
        }
        _ => {
            tracing::debug!("no flags or payload argument, keeping record defaults");
            Ok(Source::Defaults)
        }
    }
}
