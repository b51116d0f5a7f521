//! Implementation of `parley ask`, `parley reply`, and `parley delete`.

use anyhow::Result;
use parley_core::config::ParleyConfig;

use crate::cli::commands::helpers::{open_services, CallerArgs};
use crate::output::{Formatter, OutputFormat};

/// Ask a new question as the caller.
#[tracing::instrument(skip(config, content, format))]
pub fn run_ask(
    config: &ParleyConfig,
    caller: CallerArgs,
    content: &str,
    kind: &str,
    escalate: bool,
    format: OutputFormat,
) -> Result<()> {
    let caller = caller.resolve()?;
    let services = open_services(config)?;

    let message = services
        .messages()
        .ask(caller.user_id, content, Some(kind), escalate)?;

    Formatter::new(format).print(&message)?;
    Ok(())
}

/// Reply inside a thread as the caller.
///
/// Without `--parent` the reply targets the newest message in the thread,
/// the way a chat view answers the last message shown.
#[tracing::instrument(skip(config, content, format))]
pub fn run_reply(
    config: &ParleyConfig,
    caller: CallerArgs,
    thread_id: i64,
    parent_id: Option<i64>,
    content: &str,
    kind: &str,
    format: OutputFormat,
) -> Result<()> {
    let caller = caller.resolve()?;
    let services = open_services(config)?;
    let messages = services.messages();

    let message = match parent_id {
        Some(parent_id) => messages.reply(
            thread_id,
            parent_id,
            caller.user_id,
            caller.role,
            content,
            Some(kind),
        )?,
        None => messages.reply_to_latest(
            thread_id,
            caller.user_id,
            caller.role,
            content,
            Some(kind),
        )?,
    };

    Formatter::new(format).print(&message)?;
    Ok(())
}

/// Permanently delete one message.
#[tracing::instrument(skip(config, format))]
pub fn run_delete(config: &ParleyConfig, message_id: i64, format: OutputFormat) -> Result<()> {
    let services = open_services(config)?;
    services.messages().delete(message_id)?;

    let output = serde_json::json!({
        "deleted": message_id,
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}
