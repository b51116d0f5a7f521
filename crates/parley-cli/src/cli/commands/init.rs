//! Implementation of `parley init`.

use anyhow::Result;
use parley_core::config::ParleyConfig;
use parley_core::core::ParleyContext;

use crate::output::{Formatter, OutputFormat};

/// Create the data directory and schema. Safe to re-run.
#[tracing::instrument(skip(config, format))]
pub fn run_init(config: &ParleyConfig, format: OutputFormat) -> Result<()> {
    let already = config.db_path().exists();
    let ctx = ParleyContext::init(config.clone())?;

    let output = serde_json::json!({
        "initialized": !already,
        "db_path": ctx.config().db_path().display().to_string(),
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}
