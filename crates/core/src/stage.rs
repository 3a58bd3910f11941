//! Stage resolution entry points
//!
//! Schema → source → (payload) → validation → next payload.

use crate::chain::advance;
use crate::flags::ParseContext;
use crate::payload::{apply_fields, decode_flat, decode_payload, Payload};
use crate::resolver::{resolve_source, Source};
use crate::schema::{Schema, StageConfig};
use crate::validation::validate_required;
use crate::Result;

/// Resolve a stage config and build the payload for the next stage.
///
/// Flags take precedence over a JSON payload argument. The payload may use
/// the `{current, remaining}` envelope or the legacy flat shape. After
/// required fields are validated, the head of `remaining` becomes the next
/// stage's `current`.
pub fn resolve_stage<C: StageConfig>(ctx: &mut ParseContext, record: &mut C) -> Result<Payload> {
    let schema = Schema::build(&*record)?;

    let remaining = match resolve_source(ctx, &schema, record)? {
        Source::Payload(raw) => {
            let incoming = decode_payload(&raw)?;
            let applied = apply_fields(&schema, &incoming.fields, record)?;
            tracing::debug!(
                applied,
                legacy = incoming.legacy,
                queued = incoming.remaining.len(),
                "applied payload fields"
            );
            incoming.remaining
        }
        Source::Flags | Source::Defaults => Vec::new(),
    };

    validate_required(&schema, &*record)?;

    let next = advance(remaining);
    tracing::info!(
        fields = schema.len(),
        remaining = next.remaining.len(),
        exhausted = next.is_exhausted(),
        "stage config resolved"
    );
    Ok(next)
}

/// Resolve a stage config from process arguments.
///
/// Fails with `Error::AlreadyParsed` if process arguments were already
/// taken in this process.
pub fn resolve_stage_from_env<C: StageConfig>(record: &mut C) -> Result<Payload> {
    let mut ctx = ParseContext::from_process_args()?;
    resolve_stage(&mut ctx, record)
}

/// Populate a config without chaining.
///
/// Same precedence as [`resolve_stage`], but a payload argument is always
/// read as a flat field object and no next payload is produced.
pub fn configure<C: StageConfig>(ctx: &mut ParseContext, record: &mut C) -> Result<()> {
    let schema = Schema::build(&*record)?;

    if let Source::Payload(raw) = resolve_source(ctx, &schema, record)? {
        let fields = decode_flat(&raw)?;
        apply_fields(&schema, &fields, record)?;
    }

    validate_required(&schema, &*record)
}
