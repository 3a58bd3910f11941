//! End-to-end stage resolution
//!
//! Drives `resolve_stage` with explicit argument lists the way a worker
//! process receives them: flags, the `{current, remaining}` envelope, the
//! legacy flat object, and broken input.

use serde_json::{json, Value};
use stagechain_core::{resolve_stage, Error, FieldMap, ParseContext, Payload, StageConfig};

#[derive(Debug, Default, StageConfig)]
struct DistrictStage {
    #[config = "district_id,required"]
    district_id: String,
    #[config = "collection"]
    collection: String,
}

#[derive(Debug, Default, StageConfig)]
struct FlaggedStage {
    #[config = "district_id,required"]
    district_id: String,
    #[config = "dry_run"]
    dry_run: bool,
}

#[derive(Debug, Default, StageConfig)]
struct RequiredFlagStage {
    #[config = "district_id"]
    district_id: String,
    #[config = "force,required"]
    force: bool,
}

fn run(args: &[&str]) -> (Result<Payload, Error>, DistrictStage) {
    let mut config = DistrictStage::default();
    let mut ctx = ParseContext::new(args.iter().copied());
    let result = resolve_stage(&mut ctx, &mut config);
    (result, config)
}

fn object(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn assert_missing_district(result: Result<Payload, Error>) {
    match result {
        Err(Error::MissingRequiredFields(keys)) => assert_eq!(keys, vec!["district_id".to_string()]),
        other => panic!("expected missing district_id, got {:?}", other),
    }
}

// =============================================================================
// Flags
// =============================================================================

#[test]
fn test_flags_populate_record() {
    let (result, config) = run(&["-district_id=abc123"]);
    let next = result.unwrap();

    assert_eq!(config.district_id, "abc123");
    assert_eq!(config.collection, "");
    assert!(next.current.is_empty());
    assert!(next.remaining.is_empty());
}

#[test]
fn test_flags_skip_json_argument() {
    // GIVEN: a flag for the optional field and a payload with the required one
    let (result, config) = run(&["-collection=schools", r#"{"district_id":"abc123"}"#]);

    // THEN: the payload is never read, so the required field stays empty
    assert_missing_district(result);
    assert_eq!(config.collection, "schools");
    assert_eq!(config.district_id, "");
}

#[test]
fn test_flags_win_even_with_full_envelope() {
    let (result, config) = run(&[
        "-district_id=fromflag",
        r#"{"current":{"district_id":"fromjson"},"remaining":[{"district_id":"abc456"}]}"#,
    ]);
    let next = result.unwrap();

    assert_eq!(config.district_id, "fromflag");
    // the queue belongs to the skipped payload
    assert!(next.is_exhausted());
}

#[test]
fn test_undeclared_flag_fails() {
    let (result, _) = run(&["-district_id=abc123", "-random-test-flag=X"]);
    let err = result.unwrap_err();

    assert!(matches!(err, Error::Flag(_)));
    assert_eq!(err.to_string(), "flag provided but not defined: -random-test-flag");
}

#[test]
fn test_bool_flag_alone_counts_as_provided() {
    let mut config = FlaggedStage::default();
    let mut ctx = ParseContext::new(["-dry_run", r#"{"district_id":"abc123"}"#]);
    let err = resolve_stage(&mut ctx, &mut config).unwrap_err();

    assert!(config.dry_run);
    assert!(matches!(err, Error::MissingRequiredFields(_)));
}

// =============================================================================
// Required fields
// =============================================================================

#[test]
fn test_missing_required_field() {
    let (result, _) = run(&[]);
    assert_missing_district(result);
}

#[test]
fn test_other_field_but_not_required_field() {
    let (result, _) = run(&["-collection=schools"]);
    assert_missing_district(result);
}

#[test]
fn test_empty_current_object() {
    let (result, _) = run(&[r#"{"current":{},"remaining":[]}"#]);
    assert_missing_district(result);
}

#[test]
fn test_required_boolean_rejected_before_parsing() {
    // even a broken payload is never looked at
    let mut config = RequiredFlagStage::default();
    let mut ctx = ParseContext::new([r#"{"broken"#]);
    let err = resolve_stage(&mut ctx, &mut config).unwrap_err();

    assert!(err.is_schema_error());
    assert!(matches!(err, Error::InvalidDescriptor { .. }));
    assert!(!ctx.is_consumed());
}

// =============================================================================
// JSON payloads
// =============================================================================

#[test]
fn test_envelope_payload() {
    let (result, config) = run(&[r#"{ "current": {"district_id":"abc123"}, "remaining": [] }"#]);
    let next = result.unwrap();

    assert_eq!(config.district_id, "abc123");
    assert_eq!(next.to_json().unwrap(), r#"{"current":{},"remaining":[]}"#);
}

#[test]
fn test_legacy_payload() {
    let (result, config) = run(&[r#"{"district_id":"abc123"}"#]);
    let next = result.unwrap();

    assert_eq!(config.district_id, "abc123");
    assert!(next.current.is_empty());
    assert!(next.remaining.is_empty());
}

#[test]
fn test_all_fields_with_empty_next_item() {
    let (result, config) = run(&[
        r#"{"current": {"district_id":"abc123","collection":"schools"},"remaining":[{}]}"#,
    ]);
    let next = result.unwrap();

    assert_eq!(config.district_id, "abc123");
    assert_eq!(config.collection, "schools");
    assert_eq!(next, Payload::default());
}

#[test]
fn test_unknown_payload_keys_are_ignored() {
    let (result, config) = run(&[
        r#"{"current": {"district_id":"abc123","extra":42,"nested":{"a":1}},"remaining":[]}"#,
    ]);
    result.unwrap();
    assert_eq!(config.district_id, "abc123");
}

#[test]
fn test_broken_json() {
    let (result, _) = run(&[r#"{"collection":"not closed, oops"#]);
    assert!(matches!(result, Err(Error::InvalidJson(_))));
}

#[test]
fn test_array_payload_is_rejected() {
    let (result, config) = run(&[r#"[{"district_id":"abc123"},[{"district_id":"abc456"}]]"#]);

    assert!(matches!(result, Err(Error::InvalidJson(_))));
    assert_eq!(config.district_id, "");
}

#[test]
fn test_wrong_value_type() {
    let (result, _) = run(&[r#"{"current": {"district_id":"abc123","collection":["schools"]}}"#]);
    match result {
        Err(Error::TypeMismatch { key, found, .. }) => {
            assert_eq!(key, "collection");
            assert_eq!(found, "array");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn test_bool_field_from_payload() {
    let mut config = FlaggedStage::default();
    let mut ctx = ParseContext::new([r#"{"current":{"district_id":"abc123","dry_run":true}}"#]);
    resolve_stage(&mut ctx, &mut config).unwrap();

    assert_eq!(config.district_id, "abc123");
    assert!(config.dry_run);
}

// =============================================================================
// Chaining
// =============================================================================

#[test]
fn test_remaining_single_item() {
    let (result, _) = run(&[
        r#"{"current": {"district_id":"abc123","collection":"schools"},"remaining":[{"district_id":"abc456"}]}"#,
    ]);
    let next = result.unwrap();

    assert_eq!(next.current, object(json!({"district_id": "abc456"})));
    assert!(next.remaining.is_empty());
}

#[test]
fn test_remaining_array() {
    let (result, _) = run(&[
        r#"{"current": {"district_id":"abc123","collection":"schools"},"remaining":[{"district_id":"abc456"},{"district_id":"abc789"}]}"#,
    ]);
    let next = result.unwrap();

    assert_eq!(next.current, object(json!({"district_id": "abc456"})));
    assert_eq!(next.remaining, vec![object(json!({"district_id": "abc789"}))]);
    assert_eq!(
        next.to_json().unwrap(),
        r#"{"current":{"district_id":"abc456"},"remaining":[{"district_id":"abc789"}]}"#
    );
}

#[test]
fn test_chain_runs_stage_by_stage() -> anyhow::Result<()> {
    // each stage feeds its output payload to the next one
    let mut arg = r#"{"current":{"district_id":"a"},"remaining":[{"district_id":"b"},{"district_id":"c"}]}"#
        .to_string();
    let mut seen = Vec::new();

    loop {
        let mut config = DistrictStage::default();
        let mut ctx = ParseContext::new([arg.clone()]);
        let next = resolve_stage(&mut ctx, &mut config)?;
        seen.push(config.district_id);

        if next.is_exhausted() {
            break;
        }
        arg = next.to_json()?;
    }

    assert_eq!(seen, vec!["a", "b", "c"]);
    Ok(())
}

// =============================================================================
// Parse context
// =============================================================================

#[test]
fn test_context_cannot_be_reused() {
    let mut config = DistrictStage::default();
    let mut ctx = ParseContext::new(["-district_id=abc123"]);

    resolve_stage(&mut ctx, &mut config).unwrap();
    let err = resolve_stage(&mut ctx, &mut config).unwrap_err();
    assert!(matches!(err, Error::AlreadyParsed));
}
