//! stagechain core - stage configuration for chained batch pipelines
//!
//! A pipeline is a chain of worker processes. Each worker declares its
//! configuration as a record, receives values either as flags or as a JSON
//! payload forwarded by the previous stage, and hands the rest of the work
//! queue to the next stage.
//!
//! # Example
//!
//! ```ignore
//! use stagechain_core::{print_payload, resolve_stage_from_env, StageConfig};
//!
//! #[derive(Debug, Default, StageConfig)]
//! struct DistrictStage {
//!     #[config = "district_id,required"]
//!     district_id: String,
//!     #[config = "collection"]
//!     collection: String,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     stagechain_core::logging::init()?;
//!     let mut config = DistrictStage::default();
//!     let next = resolve_stage_from_env(&mut config)?;
//!     // ... run the stage ...
//!     print_payload(&next)?;
//!     Ok(())
//! }
//! ```
//!
//! Invocations:
//!
//! ```text
//! worker -district_id=abc123
//! worker '{"current": {"district_id": "abc123"}, "remaining": [{"district_id": "abc456"}]}'
//! worker '{"district_id": "abc123"}'
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Lets `#[derive(StageConfig)]` expand to `::stagechain_core::...` inside
// this crate as well.
extern crate self as stagechain_core;

pub mod chain;
pub mod flags;
pub mod logging;
pub mod metadata;
pub mod payload;
pub mod resolver;
pub mod schema;
pub mod stage;
pub mod validation;

mod error;
pub use error::{Error, Result};

pub use chain::advance;
pub use flags::{FlagError, FlagSet, ParseContext};
pub use payload::{decode_payload, print_payload, FieldMap, IncomingPayload, Payload};
pub use resolver::{resolve_source, Source};
pub use schema::{DeclaredKind, FieldDecl, FieldDescriptor, FieldKind, FieldValue, Schema, StageConfig};
pub use stage::{configure, resolve_stage, resolve_stage_from_env};
pub use validation::validate_required;

/// Derive macro for stage config records
pub use stagechain_core_derive::StageConfig;
