//! Derived thread state.
//!
//! Never stored. A thread's state is a pure function of its root's
//! `sent_to_admin` flag and whether any admin-authored message exists in it.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of a thread.
///
/// `Draft -> Pending` happens only through explicit escalation.
/// `Pending -> Resolved` happens as a side effect of the first admin reply.
/// There is no transition back out of `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadState {
    /// Root exists, not sent to admins.
    Draft,
    /// Sent to admins, no admin message yet (to-do).
    Pending,
    /// Sent to admins, at least one admin message (history).
    Resolved,
}

impl ThreadState {
    #[must_use]
    pub const fn classify(sent_to_admin: bool, has_admin_reply: bool) -> Self {
        match (sent_to_admin, has_admin_reply) {
            (false, _) => Self::Draft,
            (true, false) => Self::Pending,
            (true, true) => Self::Resolved,
        }
    }

    /// Whether the thread shows up in either admin view.
    #[must_use]
    pub const fn is_admin_visible(self) -> bool {
        !matches!(self, Self::Draft)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
