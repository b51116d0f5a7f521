//! Queue views over thread roots.
//!
//! Each view is a filter predicate plus an ordering over root messages,
//! evaluated against current store state on every call. Classification is
//! recomputed from `sent_to_admin` and an admin-message existence check;
//! nothing about it is cached.

use anyhow::Context;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Serialize;

use super::{message_from_row, MessageStore, MESSAGE_COLUMNS};
use crate::core::CoreResult;
use crate::message::Message;
use crate::page::{Page, PageRequest};

const HAS_ADMIN_REPLY: &str = "EXISTS (
    SELECT 1 FROM messages a WHERE a.thread_id = m.id AND a.author_role = 'ADMIN'
)";

/// A role-scoped list of thread roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueView {
    /// A user's draft roots, newest first.
    UserUnsent { user_id: i64 },
    /// Escalated, unanswered roots across all users, oldest first.
    AdminTodo,
    /// Escalated roots with at least one admin message, newest first.
    AdminHistory,
}

impl QueueView {
    /// WHERE clause and bound parameters selecting this view's roots.
    fn predicate(self) -> (String, Vec<Value>) {
        match self {
            Self::UserUnsent { user_id } => (
                "m.parent_id IS NULL AND m.author_user_id = ? AND m.sent_to_admin = 0".to_string(),
                vec![Value::Integer(user_id)],
            ),
            Self::AdminTodo => (
                format!("m.parent_id IS NULL AND m.sent_to_admin = 1 AND NOT {HAS_ADMIN_REPLY}"),
                Vec::new(),
            ),
            Self::AdminHistory => (
                format!("m.parent_id IS NULL AND m.sent_to_admin = 1 AND {HAS_ADMIN_REPLY}"),
                Vec::new(),
            ),
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            // FIFO triage: the oldest unanswered question comes first
            Self::AdminTodo => "m.created_at ASC, m.id ASC",
            Self::UserUnsent { .. } | Self::AdminHistory => "m.created_at DESC, m.id DESC",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserUnsent { .. } => "unsent",
            Self::AdminTodo => "todo",
            Self::AdminHistory => "history",
        }
    }
}

/// Counts for each queue, as shown in a dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    /// Draft roots of the requested user; `None` when no user was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsent: Option<u64>,
    pub todo: u64,
    pub history: u64,
}

impl MessageStore {
    /// Fetch one page of a queue view.
    ///
    /// The total and the content are read inside one read transaction with
    /// the same predicate, so within a single call they agree. Two separate
    /// calls may observe different totals if writers run in between.
    pub fn list_view(&self, view: QueueView, request: PageRequest) -> CoreResult<Page<Message>> {
        let (limit, offset) = request.sql_bounds();
        let (predicate, mut values) = view.predicate();

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin read transaction")?;

        let total: i64 = tx
            .query_row(
                &format!("SELECT COUNT(*) FROM messages m WHERE {predicate}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to count {} view", view.name()))?;

        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));
        let content = {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages m
                     WHERE {predicate}
                     ORDER BY {}
                     LIMIT ? OFFSET ?",
                    view.order_by()
                ))
                .with_context(|| format!("Failed to prepare {} view query", view.name()))?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), message_from_row)
                .with_context(|| format!("Failed to execute {} view query", view.name()))?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.context("Failed to read root row")?);
            }
            results
        };
        tx.commit().context("Failed to end read transaction")?;

        tracing::debug!(
            view = view.name(),
            page = request.index(),
            size = request.size(),
            total,
            returned = content.len(),
            "listed queue view"
        );
        Ok(Page::new(content, total.unsigned_abs(), request))
    }

    /// Draft roots of `user_id`, newest first.
    pub fn user_unsent(&self, user_id: i64, request: PageRequest) -> CoreResult<Page<Message>> {
        self.list_view(QueueView::UserUnsent { user_id }, request)
    }

    /// Escalated roots without an admin reply, oldest first.
    pub fn admin_todo(&self, request: PageRequest) -> CoreResult<Page<Message>> {
        self.list_view(QueueView::AdminTodo, request)
    }

    /// Escalated roots with an admin reply, newest first.
    pub fn admin_history(&self, request: PageRequest) -> CoreResult<Page<Message>> {
        self.list_view(QueueView::AdminHistory, request)
    }

    /// Lazily walk a view page by page, starting at page 0.
    ///
    /// Each step re-queries the store. Start over by calling this again.
    #[must_use]
    pub fn pages(&self, view: QueueView, page_size: usize) -> ViewPages<'_> {
        ViewPages {
            store: self,
            view,
            next: PageRequest::new(0, page_size),
            done: false,
        }
    }

    /// Count every queue in one read transaction.
    pub fn queue_summary(&self, user_id: Option<i64>) -> CoreResult<QueueSummary> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin read transaction")?;

        let count = |view: QueueView| -> CoreResult<u64> {
            let (predicate, values) = view.predicate();
            let n: i64 = tx
                .query_row(
                    &format!("SELECT COUNT(*) FROM messages m WHERE {predicate}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )
                .with_context(|| format!("Failed to count {} view", view.name()))?;
            Ok(n.unsigned_abs())
        };

        let unsent = match user_id {
            Some(user_id) => Some(count(QueueView::UserUnsent { user_id })?),
            None => None,
        };
        let summary = QueueSummary {
            unsent,
            todo: count(QueueView::AdminTodo)?,
            history: count(QueueView::AdminHistory)?,
        };
        tx.commit().context("Failed to end read transaction")?;
        Ok(summary)
    }
}

/// Iterator over the pages of a queue view.
///
/// Stops after the first empty page, or after the first error.
pub struct ViewPages<'a> {
    store: &'a MessageStore,
    view: QueueView,
    next: CoreResult<PageRequest>,
    done: bool,
}

impl Iterator for ViewPages<'_> {
    type Item = CoreResult<Page<Message>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let request = match &self.next {
            Ok(request) => *request,
            Err(_) => {
                self.done = true;
                let err = std::mem::replace(&mut self.next, Ok(PageRequest::first()));
                return err.err().map(Err);
            }
        };

        match self.store.list_view(self.view, request) {
            Ok(page) if page.content.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                if !page.has_next() {
                    self.done = true;
                }
                self.next = Ok(request.next());
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
