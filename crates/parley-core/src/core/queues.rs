//! Queue service: drafts, admin to-do, admin history.

use crate::message::Message;
use crate::page::{Page, PageRequest};
use crate::store::{MessageStore, QueueSummary, QueueView, ViewPages};

use super::CoreResult;

/// Service for queue listings.
pub struct QueueService<'a> {
    store: &'a MessageStore,
}

impl<'a> QueueService<'a> {
    pub(crate) const fn new(store: &'a MessageStore) -> Self {
        Self { store }
    }

    /// A user's questions not yet sent to admins, newest first.
    pub fn user_unsent(&self, user_id: i64, request: PageRequest) -> CoreResult<Page<Message>> {
        self.store.user_unsent(user_id, request)
    }

    /// Escalated questions without an admin reply, oldest first.
    pub fn admin_todo(&self, request: PageRequest) -> CoreResult<Page<Message>> {
        self.store.admin_todo(request)
    }

    /// Escalated questions with at least one admin reply, newest first.
    pub fn admin_history(&self, request: PageRequest) -> CoreResult<Page<Message>> {
        self.store.admin_history(request)
    }

    /// Walk any view lazily, one page per step.
    #[must_use]
    pub fn pages(&self, view: QueueView, page_size: usize) -> ViewPages<'a> {
        self.store.pages(view, page_size)
    }

    /// Counts for each queue; includes the user's drafts when `user_id` is given.
    pub fn summary(&self, user_id: Option<i64>) -> CoreResult<QueueSummary> {
        self.store.queue_summary(user_id)
    }
}
