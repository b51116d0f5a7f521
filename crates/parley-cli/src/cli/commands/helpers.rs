//! Shared helpers for CLI commands.

use anyhow::Result;
use parley_core::config::ParleyConfig;
use parley_core::core::{ParleyContext, ParleyServices};
use parley_core::identity::{resolve_caller, resolve_optional_caller, Caller};
use parley_core::message::AuthorRole;
use parley_core::page::PageRequest;

use crate::cli::PagingArgs;

/// Identity flags carried from the global CLI options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerArgs {
    pub user: Option<i64>,
    pub role: Option<AuthorRole>,
}

impl CallerArgs {
    /// Resolve the caller from flags, then environment.
    pub fn resolve(self) -> Result<Caller> {
        resolve_caller(self.user, self.role)
    }

    /// Like `resolve`, but `None` when no identity was given at all.
    pub fn resolve_optional(self) -> Result<Option<Caller>> {
        resolve_optional_caller(self.user, self.role)
    }
}

/// Open an initialized parley database and return the service facade.
pub fn open_services(config: &ParleyConfig) -> Result<ParleyServices> {
    let ctx = ParleyContext::new(config.clone())?;
    Ok(ctx.services()?)
}

/// Build a validated page request, falling back to the configured page size.
pub fn page_request(config: &ParleyConfig, paging: PagingArgs) -> Result<PageRequest> {
    let size = paging.size.unwrap_or_else(|| config.default_page_size());
    Ok(PageRequest::new(paging.page, size)?)
}
