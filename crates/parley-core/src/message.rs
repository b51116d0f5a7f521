//! Message model: the only persisted entity.
//!
//! A thread is not stored; it is the set of messages sharing a `thread_id`,
//! rooted at the message whose `id` equals that `thread_id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CoreError, CoreResult};

/// Content kind used when the caller does not supply one.
pub const DEFAULT_MESSAGE_TYPE: &str = "TEXT";

/// Role of the account that wrote a message. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorRole {
    User,
    Admin,
}

impl AuthorRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown author role '{0}' (expected USER or ADMIN)")]
pub struct ParseRoleError(String);

impl FromStr for AuthorRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl ToSql for AuthorRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AuthorRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A single stored message: a thread root (question) or a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub thread_id: i64,
    /// `None` only for the thread's root message.
    pub parent_id: Option<i64>,
    pub author_user_id: i64,
    pub author_role: AuthorRole,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    /// Only meaningful on roots; always `false` on replies.
    pub sent_to_admin: bool,
}

impl Message {
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Trim message content, rejecting blank bodies.
pub(crate) fn normalize_content(content: &str) -> CoreResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid("message content must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Normalize a content kind tag. The tag itself is opaque to the core.
pub(crate) fn normalize_kind(kind: Option<&str>) -> CoreResult<String> {
    match kind.map(str::trim) {
        None => Ok(DEFAULT_MESSAGE_TYPE.to_string()),
        Some("") => Err(CoreError::invalid("message type must not be blank")),
        Some(k) => Ok(k.to_string()),
    }
}
