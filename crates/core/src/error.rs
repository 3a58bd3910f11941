//! Error types for stagechain core

use thiserror::Error;

use crate::flags::FlagError;
use crate::schema::FieldKind;

/// Result type alias for stagechain core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while resolving a stage configuration
///
/// Every variant is terminal for the current resolution call. The record may
/// be partially populated when one is returned.
#[derive(Debug, Error)]
pub enum Error {
    // =========================================================================
    // Schema declaration defects (detected before any input is read)
    // =========================================================================
    /// Field type is neither `String` nor `bool`
    #[error("field '{field}' has unsupported type '{type_name}': only string/bool values are allowed in a config record")]
    UnsupportedKind {
        /// Rust field name
        field: String,
        /// Declared Rust type
        type_name: String,
    },

    /// Field has no `#[config]` key
    #[error("field '{field}' must declare a non-empty config key")]
    MissingKey {
        /// Rust field name
        field: String,
    },

    /// Tag is malformed or carries an unknown modifier
    #[error("field '{field}' has invalid config tag '{tag}': {reason}")]
    InvalidDescriptor {
        /// Rust field name
        field: String,
        /// Raw tag text
        tag: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Record cannot read or write one of its declared fields
    #[error("field '{field}' is not addressable on the config record")]
    NotAddressable {
        /// Rust field name
        field: String,
    },

    // =========================================================================
    // Input resolution
    // =========================================================================
    /// Arguments of this parse context were already consumed
    #[error("arguments were already parsed; a parse context supports a single pass")]
    AlreadyParsed,

    /// Flag parsing failed
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// Payload argument is not well-formed JSON
    #[error("invalid JSON found in arguments: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Payload value has the wrong JSON type for its field
    #[error("field '{key}' expected a {expected} value, got {found}")]
    TypeMismatch {
        /// Config key
        key: String,
        /// Declared kind
        expected: FieldKind,
        /// JSON type that was found
        found: &'static str,
    },

    /// One or more required fields are empty after resolution
    #[error("Missing required fields: [{}]", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    // =========================================================================
    // Ambient
    // =========================================================================
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl Error {
    /// Keys reported missing, if this is a missing-fields error
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Error::MissingRequiredFields(keys) => Some(keys),
            _ => None,
        }
    }

    /// Whether the error comes from the record declaration rather than input
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedKind { .. }
                | Error::MissingKey { .. }
                | Error::InvalidDescriptor { .. }
                | Error::NotAddressable { .. }
        )
    }
}
