//! Implementation of `parley escalate` and `parley escalate-all`.

use anyhow::Result;
use parley_core::config::ParleyConfig;

use crate::cli::commands::helpers::{open_services, CallerArgs};
use crate::output::{Formatter, OutputFormat};

/// Set or clear the escalation flag on one thread root.
#[tracing::instrument(skip(config, format))]
pub fn run_escalate(
    config: &ParleyConfig,
    root_id: i64,
    undo: bool,
    format: OutputFormat,
) -> Result<()> {
    let services = open_services(config)?;
    let update = services.escalation().set(root_id, !undo)?;

    let output = serde_json::json!({
        "root_id": update.root_id,
        "sent_to_admin": update.value,
        "changed": update.changed,
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}

/// Set or clear the flag on every root a user authored.
///
/// Defaults to the caller's own questions.
#[tracing::instrument(skip(config, format))]
pub fn run_escalate_all(
    config: &ParleyConfig,
    caller: CallerArgs,
    user_id: Option<i64>,
    undo: bool,
    format: OutputFormat,
) -> Result<()> {
    let user_id = match user_id {
        Some(id) => id,
        None => caller.resolve()?.user_id,
    };
    let services = open_services(config)?;
    let changed = services.escalation().set_all_for_user(user_id, !undo)?;

    let output = serde_json::json!({
        "user_id": user_id,
        "sent_to_admin": !undo,
        "changed": changed,
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}
