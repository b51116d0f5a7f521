//! Thread service: fetch a thread, read its derived state.

use serde::Serialize;

use crate::message::Message;
use crate::state::ThreadState;
use crate::store::MessageStore;

use super::{CoreError, CoreResult};

/// A thread with its derived state, for display.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub thread_id: i64,
    pub state: ThreadState,
    pub message_count: usize,
    pub messages: Vec<Message>,
}

/// Service for thread operations.
pub struct ThreadService<'a> {
    store: &'a MessageStore,
}

impl<'a> ThreadService<'a> {
    pub(crate) const fn new(store: &'a MessageStore) -> Self {
        Self { store }
    }

    /// All messages of a thread, oldest first.
    ///
    /// Returns `Err(CoreError::ThreadNotFound)` if the thread has no root.
    pub fn get(&self, thread_id: i64) -> CoreResult<Vec<Message>> {
        if !self.store.root_exists(thread_id)? {
            return Err(CoreError::ThreadNotFound { thread_id });
        }
        self.store.thread_messages(thread_id)
    }

    /// Messages of a thread, returning `None` if it has no root.
    pub fn get_optional(&self, thread_id: i64) -> CoreResult<Option<Vec<Message>>> {
        match self.get(thread_id) {
            Ok(messages) => Ok(Some(messages)),
            Err(CoreError::ThreadNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Derived state of a thread.
    pub fn state(&self, thread_id: i64) -> CoreResult<ThreadState> {
        self.store
            .thread_state(thread_id)?
            .ok_or(CoreError::ThreadNotFound { thread_id })
    }

    /// Thread messages together with the derived state, from one snapshot.
    pub fn view(&self, thread_id: i64) -> CoreResult<ThreadView> {
        let (state, messages) = self
            .store
            .thread_snapshot(thread_id)?
            .ok_or(CoreError::ThreadNotFound { thread_id })?;
        Ok(ThreadView {
            thread_id,
            state,
            message_count: messages.len(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::test_support::services;
    use crate::core::{CoreError, ErrorKind};
    use crate::message::AuthorRole;
    use crate::state::ThreadState;

    #[test]
    fn test_get_unknown_thread_is_not_found() {
        let services = services();
        let err = services.threads().get(404).unwrap_err();
        assert!(matches!(err, CoreError::ThreadNotFound { thread_id: 404 }));
        assert!(services.threads().get_optional(404).unwrap().is_none());
    }

    #[test]
    fn test_get_after_root_deleted_is_not_found() {
        let services = services();
        let root = services.messages().ask(7, "q", None, false).unwrap();
        services
            .messages()
            .reply(root.id, root.id, 7, AuthorRole::User, "r", None)
            .unwrap();
        services.messages().delete(root.id).unwrap();

        assert_eq!(
            services.threads().get(root.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_view_reports_state() {
        let services = services();
        let root = services.messages().ask(7, "q", None, true).unwrap();
        let view = services.threads().view(root.id).unwrap();
        assert_eq!(view.state, ThreadState::Pending);
        assert_eq!(view.message_count, 1);

        services
            .messages()
            .reply(root.id, root.id, 1, AuthorRole::Admin, "a", None)
            .unwrap();
        let view = services.threads().view(root.id).unwrap();
        assert_eq!(view.state, ThreadState::Resolved);
        assert_eq!(view.messages.len(), 2);
    }
}
