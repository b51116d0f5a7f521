//! Implementation of `parley unsent`, `parley todo`, `parley history`, and `parley summary`.

use anyhow::Result;
use parley_core::config::ParleyConfig;

use crate::cli::commands::helpers::{open_services, page_request, CallerArgs};
use crate::cli::PagingArgs;
use crate::output::{Formatter, OutputFormat};

/// List the caller's questions that were never sent to administrators.
#[tracing::instrument(skip(config, format))]
pub fn run_unsent(
    config: &ParleyConfig,
    caller: CallerArgs,
    paging: PagingArgs,
    format: OutputFormat,
) -> Result<()> {
    let caller = caller.resolve()?;
    let request = page_request(config, paging)?;
    let services = open_services(config)?;
    let page = services.queues().user_unsent(caller.user_id, request)?;

    Formatter::new(format).print_page(
        &page,
        "No unsent questions",
        &["parley escalate <root_id>", "parley escalate-all"],
    )?;
    Ok(())
}

/// List escalated questions awaiting an admin reply, oldest first.
#[tracing::instrument(skip(config, format))]
pub fn run_todo(config: &ParleyConfig, paging: PagingArgs, format: OutputFormat) -> Result<()> {
    let request = page_request(config, paging)?;
    let services = open_services(config)?;
    let page = services.queues().admin_todo(request)?;

    Formatter::new(format).print_page(
        &page,
        "Nothing to do",
        &["parley --role admin reply <thread_id> \"...\""],
    )?;
    Ok(())
}

/// List escalated questions that already have an admin reply, newest first.
#[tracing::instrument(skip(config, format))]
pub fn run_history(
    config: &ParleyConfig,
    paging: PagingArgs,
    format: OutputFormat,
) -> Result<()> {
    let request = page_request(config, paging)?;
    let services = open_services(config)?;
    let page = services.queues().admin_history(request)?;

    Formatter::new(format).print_page(
        &page,
        "No answered questions yet",
        &["parley thread show <thread_id>"],
    )?;
    Ok(())
}

/// Print queue counts; includes the caller's drafts when a caller is known.
#[tracing::instrument(skip(config, format))]
pub fn run_summary(config: &ParleyConfig, caller: CallerArgs, format: OutputFormat) -> Result<()> {
    let user_id = caller.resolve_optional()?.map(|c| c.user_id);
    let services = open_services(config)?;
    let summary = services.queues().summary(user_id)?;

    Formatter::new(format).print(&summary)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::run_init;
    use tempfile::TempDir;

    #[test]
    fn test_listings_run_on_empty_database() {
        let temp = TempDir::new().unwrap();
        let config = ParleyConfig::new(temp.path());
        run_init(&config, OutputFormat::Json).unwrap();
        let paging = PagingArgs { page: 0, size: None };
        let caller = CallerArgs {
            user: Some(7),
            role: None,
        };

        run_unsent(&config, caller, paging, OutputFormat::Text).unwrap();
        run_todo(&config, paging, OutputFormat::Json).unwrap();
        run_history(&config, paging, OutputFormat::Text).unwrap();
        run_summary(&config, caller, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp = TempDir::new().unwrap();
        let config = ParleyConfig::new(temp.path());
        run_init(&config, OutputFormat::Json).unwrap();

        let paging = PagingArgs {
            page: 0,
            size: Some(0),
        };
        assert!(run_todo(&config, paging, OutputFormat::Json).is_err());
    }
}
