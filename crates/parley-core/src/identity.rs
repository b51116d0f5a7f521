//! Caller identity resolution.
//!
//! Authentication happens upstream; by the time a request reaches parley the
//! caller's user id and role claim are trusted. This module only decides
//! where those two values come from.

use std::env;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::message::AuthorRole;

/// Environment variable carrying the caller's numeric user id.
pub const USER_VAR: &str = "PARLEY_USER";
/// Environment variable carrying the caller's role claim.
pub const ROLE_VAR: &str = "PARLEY_ROLE";

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub user_id: i64,
    pub role: AuthorRole,
}

impl Caller {
    #[must_use]
    pub const fn user(user_id: i64) -> Self {
        Self {
            user_id,
            role: AuthorRole::User,
        }
    }

    #[must_use]
    pub const fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            role: AuthorRole::Admin,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, AuthorRole::Admin)
    }
}

/// Resolve the caller.
///
/// Resolution order:
/// 1. Explicit overrides (`--user`, `--role`)
/// 2. `PARLEY_USER` / `PARLEY_ROLE`
/// 3. Role defaults to `USER`; the user id has no default.
pub fn resolve_caller(
    explicit_user: Option<i64>,
    explicit_role: Option<AuthorRole>,
) -> Result<Caller> {
    match resolve_optional_caller(explicit_user, explicit_role)? {
        Some(caller) => Ok(caller),
        None => bail!("Caller identity required. Use --user <id> or set {USER_VAR}."),
    }
}

/// Resolve the caller if any identity was supplied.
///
/// Returns `Ok(None)` only when neither `--user` nor `PARLEY_USER` is set.
/// A malformed value is still an error.
pub fn resolve_optional_caller(
    explicit_user: Option<i64>,
    explicit_role: Option<AuthorRole>,
) -> Result<Option<Caller>> {
    caller_from(explicit_user, explicit_role, env_value(USER_VAR), env_value(ROLE_VAR))
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn caller_from(
    explicit_user: Option<i64>,
    explicit_role: Option<AuthorRole>,
    env_user: Option<String>,
    env_role: Option<String>,
) -> Result<Option<Caller>> {
    let user_id = match (explicit_user, env_user) {
        (Some(id), _) => id,
        (None, Some(raw)) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {USER_VAR}: {raw}"))?,
        (None, None) => return Ok(None),
    };

    let role = match (explicit_role, env_role) {
        (Some(role), _) => role,
        (None, Some(raw)) => raw
            .parse()
            .with_context(|| format!("Invalid {ROLE_VAR}: {raw}"))?,
        (None, None) => AuthorRole::User,
    };

    Ok(Some(Caller { user_id, role }))
}
