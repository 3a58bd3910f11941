//! stagechain worker - reference pipeline stage
//!
//! Resolves its config from flags or the payload handed over by the previous
//! stage, then prints the payload for the next stage on stdout. Logs go to
//! stderr.
//!
//! # Usage
//!
//! ```bash
//! # Single run from flags
//! stagechain-worker -district_id=abc123 -collection=schools
//!
//! # Chained run; stdout feeds the next invocation
//! stagechain-worker '{"current":{"district_id":"abc123"},"remaining":[{"district_id":"abc456"}]}'
//!
//! # Pre-envelope payload
//! stagechain-worker '{"district_id":"abc123"}'
//! ```

use anyhow::{Context, Result};
use stagechain_core::{logging, print_payload, resolve_stage_from_env, StageConfig};

/// Config for one district sync
#[derive(Debug, Default, StageConfig)]
struct DistrictStage {
    #[config = "district_id,required"]
    district_id: String,
    #[config = "collection"]
    collection: String,
    #[config = "dry_run"]
    dry_run: bool,
}

fn main() -> Result<()> {
    logging::init().context("Failed to initialize logging")?;

    let mut config = DistrictStage::default();
    let next = resolve_stage_from_env(&mut config).context("Failed to resolve stage config")?;

    tracing::info!(
        district_id = %config.district_id,
        collection = %config.collection,
        dry_run = config.dry_run,
        "running stage"
    );
    if config.dry_run {
        tracing::info!("dry run, skipping work");
    }

    print_payload(&next).context("Failed to write next payload")?;
    Ok(())
}
