//! Escalation service: send threads to the admin queue.

use crate::store::{FlagUpdate, MessageStore};

use super::CoreResult;

/// Service for escalation flag operations.
pub struct EscalationService<'a> {
    store: &'a MessageStore,
}

impl<'a> EscalationService<'a> {
    pub(crate) const fn new(store: &'a MessageStore) -> Self {
        Self { store }
    }

    /// Escalate one thread (or, with `value = false`, pull it back).
    ///
    /// Idempotent: setting the value the flag already has succeeds unchanged.
    pub fn set(&self, root_id: i64, value: bool) -> CoreResult<FlagUpdate> {
        self.store.set_sent_to_admin(root_id, value)
    }

    /// Set the flag only if it still holds `expected`; `Conflict` otherwise.
    pub fn compare_and_set(
        &self,
        root_id: i64,
        expected: bool,
        value: bool,
    ) -> CoreResult<FlagUpdate> {
        self.store
            .compare_and_set_sent_to_admin(root_id, expected, value)
    }

    /// Escalate one thread.
    pub fn escalate(&self, root_id: i64) -> CoreResult<FlagUpdate> {
        self.set(root_id, true)
    }

    /// Set the flag on every root the user authored, in one atomic update.
    ///
    /// Returns how many roots changed.
    pub fn set_all_for_user(&self, user_id: i64, value: bool) -> CoreResult<usize> {
        self.store.bulk_set_sent_to_admin(user_id, value)
    }
}
