//! Process argument guard
//!
//! Contexts over the real process arguments can be created once per process.
//! Kept in its own test binary, with a single test, so no other test touches
//! the guard first.

use stagechain_core::{resolve_stage_from_env, Error, ParseContext, StageConfig};

#[derive(Debug, Default, StageConfig)]
struct DistrictStage {
    #[config = "district_id"]
    district_id: String,
}

#[test]
fn test_process_args_taken_once() {
    // GIVEN: the first context over the process arguments
    let first = ParseContext::from_process_args().unwrap();
    assert!(!first.is_consumed());

    // WHEN: another context is requested
    let second = ParseContext::from_process_args();

    // THEN: the arguments are already taken
    assert!(matches!(second, Err(Error::AlreadyParsed)));

    let mut config = DistrictStage::default();
    let result = resolve_stage_from_env(&mut config);
    assert!(matches!(result, Err(Error::AlreadyParsed)));
    assert_eq!(config.district_id, "");
}
