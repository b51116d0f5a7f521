//! Message service: ask a question, reply, delete.

use crate::message::{AuthorRole, Message};
use crate::store::MessageStore;

use super::{CoreError, CoreResult};

/// Service for creating and removing messages.
pub struct MessageService<'a> {
    store: &'a MessageStore,
}

impl<'a> MessageService<'a> {
    pub(crate) const fn new(store: &'a MessageStore) -> Self {
        Self { store }
    }

    /// Create a question (thread root).
    ///
    /// With `escalate_now` the thread goes straight to the admin to-do queue;
    /// otherwise it stays a draft visible only to its author.
    pub fn ask(
        &self,
        author_user_id: i64,
        content: &str,
        kind: Option<&str>,
        escalate_now: bool,
    ) -> CoreResult<Message> {
        self.store
            .create_root(author_user_id, content, kind, escalate_now)
    }

    /// Reply inside a thread to a specific parent message.
    ///
    /// Never escalates: replying to a draft leaves it a draft. The first admin
    /// reply on an escalated thread moves it from to-do to history.
    pub fn reply(
        &self,
        thread_id: i64,
        parent_id: i64,
        author_user_id: i64,
        author_role: AuthorRole,
        content: &str,
        kind: Option<&str>,
    ) -> CoreResult<Message> {
        self.store.create_reply(
            thread_id,
            parent_id,
            author_user_id,
            author_role,
            content,
            kind,
        )
    }

    /// Reply to whatever message is currently newest in the thread.
    ///
    /// If another reply lands between picking the parent and appending, the
    /// new reply simply points at the older message; the thread stays valid.
    pub fn reply_to_latest(
        &self,
        thread_id: i64,
        author_user_id: i64,
        author_role: AuthorRole,
        content: &str,
        kind: Option<&str>,
    ) -> CoreResult<Message> {
        if !self.store.root_exists(thread_id)? {
            return Err(CoreError::ThreadNotFound { thread_id });
        }
        let parent = self
            .store
            .latest_in_thread(thread_id)?
            .ok_or(CoreError::ThreadNotFound { thread_id })?;
        self.reply(
            thread_id,
            parent.id,
            author_user_id,
            author_role,
            content,
            kind,
        )
    }

    /// Hard-delete one message. Deleting a root orphans its replies.
    pub fn delete(&self, message_id: i64) -> CoreResult<()> {
        self.store.delete(message_id)
    }

    /// Get a single message.
    pub fn get(&self, message_id: i64) -> CoreResult<Message> {
        self.store
            .get_message(message_id)?
            .ok_or(CoreError::MessageNotFound { message_id })
    }
}
