//! Implementation of `parley thread` subcommands.

use anyhow::Result;
use parley_core::config::ParleyConfig;

use crate::cli::commands::helpers::open_services;
use crate::output::{Formatter, OutputFormat};

/// Show every message of a thread, oldest first.
#[tracing::instrument(skip(config, format))]
pub fn run_thread_show(
    config: &ParleyConfig,
    thread_id: i64,
    format: OutputFormat,
) -> Result<()> {
    let services = open_services(config)?;
    let view = services.threads().view(thread_id)?;

    let formatter = Formatter::new(format);
    match format {
        OutputFormat::Json => formatter.print(&view)?,
        OutputFormat::Text => {
            println!(
                "thread:{} state:{} messages:{}",
                view.thread_id, view.state, view.message_count
            );
            formatter.print_list(&view.messages, "No messages", "messages", &[])?;
        }
    }
    Ok(())
}

/// Show the derived state of a thread.
#[tracing::instrument(skip(config, format))]
pub fn run_thread_state(
    config: &ParleyConfig,
    thread_id: i64,
    format: OutputFormat,
) -> Result<()> {
    let services = open_services(config)?;
    let state = services.threads().state(thread_id)?;

    let output = serde_json::json!({
        "thread_id": thread_id,
        "state": state,
        "admin_visible": state.is_admin_visible(),
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::run_init;
    use tempfile::TempDir;

    #[test]
    fn test_show_unknown_thread_fails() {
        let temp = TempDir::new().unwrap();
        let config = ParleyConfig::new(temp.path());
        run_init(&config, OutputFormat::Json).unwrap();

        let err = run_thread_show(&config, 9, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Thread not found: 9"));
        assert!(run_thread_state(&config, 9, OutputFormat::Text).is_err());
    }
}
