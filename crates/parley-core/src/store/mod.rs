//! Message store for parley.
//!
//! Durable, ordered persistence of messages in SQLite. Every write is a
//! single atomic statement or a short transaction; the only in-place
//! mutation is the root's `sent_to_admin` flag.

#![allow(clippy::missing_errors_doc)]

mod query;

pub use query::{QueueSummary, QueueView, ViewPages};

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::core::{CoreError, CoreResult};
use crate::message::{normalize_content, normalize_kind, AuthorRole, Message};
use crate::state::ThreadState;
use crate::version::{
    read_schema_version, require_supported, write_schema_version, CURRENT_SCHEMA_VERSION,
};

/// Columns selected for every `Message` read, in `Message::from_row` order.
pub(crate) const MESSAGE_COLUMNS: &str = "m.id, m.thread_id, m.parent_id, m.author_user_id, \
     m.author_role, m.content, m.type, m.created_at, m.sent_to_admin";

/// Outcome of a single-root escalation flag update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagUpdate {
    pub root_id: i64,
    pub value: bool,
    /// `false` when the flag already held `value`.
    pub changed: bool,
}

/// SQLite-backed message store.
pub struct MessageStore {
    conn: Connection,
}

impl MessageStore {
    /// Open or create a message database at the given path.
    ///
    /// Creates parent directories if they don't exist, switches the database
    /// to WAL so readers do not block the writer, and installs a busy timeout
    /// so concurrent writers wait instead of failing.
    pub fn open(path: &Path, busy_timeout: Duration) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directories: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.busy_timeout(busy_timeout)
            .context("Failed to set busy timeout")?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Failed to enable WAL journal mode")?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened message store");

        require_supported(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory message store (for tests and throwaway sessions).
    pub fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self { conn })
    }

    /// Initialize the database schema.
    ///
    /// Creates the table and indexes if they don't exist and stamps the
    /// schema version.
    pub fn init_schema(&self) -> CoreResult<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize schema")?;
        write_schema_version(&self.conn)?;
        Ok(())
    }

    /// Run `init_schema` only when the stamped version is behind.
    ///
    /// Returns whether the schema was written. A current database is left
    /// untouched, so opening it for reads takes no write lock.
    pub fn ensure_schema(&self) -> CoreResult<bool> {
        if read_schema_version(&self.conn)? >= CURRENT_SCHEMA_VERSION {
            return Ok(false);
        }
        self.init_schema()?;
        Ok(true)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create a thread root (a question).
    ///
    /// The fresh id also becomes the thread id. `sent_to_admin` starts out as
    /// `escalate_now`.
    pub fn create_root(
        &self,
        author_user_id: i64,
        content: &str,
        kind: Option<&str>,
        escalate_now: bool,
    ) -> CoreResult<Message> {
        let content = normalize_content(content)?;
        let kind = normalize_kind(kind)?;
        let now = now_micros();

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        // thread_id is patched to the assigned id before commit
        tx.execute(
            "INSERT INTO messages (
                thread_id, parent_id, author_user_id, author_role,
                content, type, created_at, sent_to_admin
            ) VALUES (
                0, NULL, ?1, ?2, ?3, ?4,
                MAX(?5, COALESCE((SELECT MAX(created_at) FROM messages), 0)),
                ?6
            )",
            params![
                author_user_id,
                AuthorRole::User,
                content,
                kind,
                now,
                escalate_now
            ],
        )
        .context("Failed to insert root message")?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE messages SET thread_id = ?1 WHERE id = ?1",
            params![id],
        )
        .context("Failed to assign thread id")?;
        tx.commit().context("Failed to commit root message")?;

        tracing::info!(id, author_user_id, escalate_now, "created root message");
        self.require_message(id)
    }

    /// Append a reply to an existing thread.
    ///
    /// The append is a single `INSERT … SELECT` guarded by the existence of
    /// the thread root and of the parent inside that thread, so a concurrent
    /// reader sees either the whole reply or nothing.
    pub fn create_reply(
        &self,
        thread_id: i64,
        parent_id: i64,
        author_user_id: i64,
        author_role: AuthorRole,
        content: &str,
        kind: Option<&str>,
    ) -> CoreResult<Message> {
        let content = normalize_content(content)?;
        let kind = normalize_kind(kind)?;
        let now = now_micros();

        let inserted = self
            .conn
            .execute(
                "INSERT INTO messages (
                    thread_id, parent_id, author_user_id, author_role,
                    content, type, created_at, sent_to_admin
                )
                SELECT ?1, ?2, ?3, ?4, ?5, ?6,
                       MAX(?7, COALESCE((SELECT MAX(created_at) FROM messages), 0)),
                       0
                WHERE EXISTS (
                    SELECT 1 FROM messages WHERE id = ?1 AND parent_id IS NULL
                )
                AND EXISTS (
                    SELECT 1 FROM messages WHERE id = ?2 AND thread_id = ?1
                )",
                params![
                    thread_id,
                    parent_id,
                    author_user_id,
                    author_role,
                    content,
                    kind,
                    now
                ],
            )
            .context("Failed to insert reply")?;

        if inserted == 0 {
            if !self.root_exists(thread_id)? {
                return Err(CoreError::ThreadNotFound { thread_id });
            }
            return Err(CoreError::InvalidParent {
                parent_id,
                thread_id,
            });
        }

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, thread_id, parent_id, role = %author_role, "appended reply");
        self.require_message(id)
    }

    /// Hard-delete a single message.
    ///
    /// Replies are never cascaded: deleting a root leaves its replies in
    /// place, unreachable through the thread root.
    pub fn delete(&self, message_id: i64) -> CoreResult<()> {
        let Some(message) = self.get_message(message_id)? else {
            return Err(CoreError::MessageNotFound { message_id });
        };

        let removed = self
            .conn
            .execute("DELETE FROM messages WHERE id = ?", params![message_id])
            .context("Failed to delete message")?;
        if removed == 0 {
            // lost a race with another delete
            return Err(CoreError::MessageNotFound { message_id });
        }

        if message.is_root() {
            let orphans = self.count_thread_messages(message.thread_id)?;
            if orphans > 0 {
                tracing::warn!(
                    thread_id = message.thread_id,
                    orphans,
                    "deleted thread root; replies left orphaned"
                );
            }
        }
        tracing::info!(message_id, "deleted message");
        Ok(())
    }

    /// Set the escalation flag on one root.
    ///
    /// Reads the current flag and applies the change with
    /// `compare_and_set_sent_to_admin`. Setting the value it already has
    /// succeeds without change, including when a concurrent writer got there
    /// first.
    pub fn set_sent_to_admin(&self, root_id: i64, value: bool) -> CoreResult<FlagUpdate> {
        let current = self.root_flag(root_id)?;
        if current == value {
            return Ok(FlagUpdate {
                root_id,
                value,
                changed: false,
            });
        }

        match self.compare_and_set_sent_to_admin(root_id, current, value) {
            Err(CoreError::Conflict { .. }) if self.root_flag(root_id)? == value => {
                Ok(FlagUpdate {
                    root_id,
                    value,
                    changed: false,
                })
            }
            other => other,
        }
    }

    /// Set the escalation flag only if it still holds `expected`.
    ///
    /// One guarded UPDATE. Returns `Conflict` when the stored flag differs
    /// from `expected`; the caller should re-read and retry.
    pub fn compare_and_set_sent_to_admin(
        &self,
        root_id: i64,
        expected: bool,
        value: bool,
    ) -> CoreResult<FlagUpdate> {
        let updated = self
            .conn
            .execute(
                "UPDATE messages SET sent_to_admin = ?1
                 WHERE id = ?2 AND parent_id IS NULL AND sent_to_admin = ?3",
                params![value, root_id, expected],
            )
            .context("Failed to update sent_to_admin")?;

        if updated == 0 {
            // missing rows and replies surface as NotFound/NotARoot
            self.root_flag(root_id)?;
            tracing::debug!(root_id, expected, "sent_to_admin precondition failed");
            return Err(CoreError::Conflict {
                message_id: root_id,
            });
        }

        let changed = expected != value;
        if changed {
            tracing::info!(root_id, value, "updated sent_to_admin");
        }
        Ok(FlagUpdate {
            root_id,
            value,
            changed,
        })
    }

    /// Set the escalation flag on every root authored by `user_id`.
    ///
    /// One UPDATE statement, so it applies to all matching roots or none.
    /// Returns the number of roots whose flag changed.
    pub fn bulk_set_sent_to_admin(&self, user_id: i64, value: bool) -> CoreResult<usize> {
        let changed = self
            .conn
            .execute(
                "UPDATE messages SET sent_to_admin = ?1
                 WHERE author_user_id = ?2 AND parent_id IS NULL AND sent_to_admin <> ?1",
                params![value, user_id],
            )
            .context("Failed to bulk update sent_to_admin")?;
        tracing::info!(user_id, value, changed, "bulk updated sent_to_admin");
        Ok(changed)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get a single message by id.
    pub fn get_message(&self, message_id: i64) -> CoreResult<Option<Message>> {
        let message = self
            .conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?"),
                params![message_id],
                message_from_row,
            )
            .optional()
            .context("Failed to query message")?;
        Ok(message)
    }

    fn require_message(&self, message_id: i64) -> CoreResult<Message> {
        self.get_message(message_id)?
            .ok_or(CoreError::MessageNotFound { message_id })
    }

    /// Whether a root message exists for `thread_id`.
    pub fn root_exists(&self, thread_id: i64) -> CoreResult<bool> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM messages WHERE id = ? AND parent_id IS NULL)",
                params![thread_id],
                |row| row.get(0),
            )
            .context("Failed to check thread root")?;
        Ok(exists)
    }

    /// All messages of a thread, oldest first (`created_at`, then `id`).
    ///
    /// Returns an empty list for unknown threads; use `root_exists` to tell
    /// "no thread" from "no messages".
    pub fn thread_messages(&self, thread_id: i64) -> CoreResult<Vec<Message>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.thread_id = ?
                 ORDER BY m.created_at ASC, m.id ASC"
            ))
            .context("Failed to prepare thread_messages query")?;

        let rows = stmt
            .query_map(params![thread_id], message_from_row)
            .context("Failed to execute thread_messages query")?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.context("Failed to read message row")?);
        }
        Ok(results)
    }

    /// Newest message of a thread, if any.
    pub fn latest_in_thread(&self, thread_id: i64) -> CoreResult<Option<Message>> {
        let message = self
            .conn
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages m
                     WHERE m.thread_id = ?
                     ORDER BY m.created_at DESC, m.id DESC
                     LIMIT 1"
                ),
                params![thread_id],
                message_from_row,
            )
            .optional()
            .context("Failed to query latest message")?;
        Ok(message)
    }

    /// Whether any admin-authored message exists in the thread.
    pub fn has_admin_reply(&self, thread_id: i64) -> CoreResult<bool> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM messages WHERE thread_id = ? AND author_role = 'ADMIN'
                 )",
                params![thread_id],
                |row| row.get(0),
            )
            .context("Failed to check for admin reply")?;
        Ok(exists)
    }

    /// Derived state of a thread; `None` when the thread has no root.
    pub fn thread_state(&self, thread_id: i64) -> CoreResult<Option<ThreadState>> {
        let row: Option<(bool, bool)> = self
            .conn
            .query_row(
                "SELECT r.sent_to_admin,
                        EXISTS (
                            SELECT 1 FROM messages a
                            WHERE a.thread_id = r.id AND a.author_role = 'ADMIN'
                        )
                 FROM messages r
                 WHERE r.id = ? AND r.parent_id IS NULL",
                params![thread_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to query thread state")?;
        Ok(row.map(|(sent, answered)| ThreadState::classify(sent, answered)))
    }

    /// State and messages of a thread read inside one read transaction.
    ///
    /// `None` when the thread has no root.
    pub fn thread_snapshot(
        &self,
        thread_id: i64,
    ) -> CoreResult<Option<(ThreadState, Vec<Message>)>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin read transaction")?;
        let Some(state) = self.thread_state(thread_id)? else {
            return Ok(None);
        };
        let messages = self.thread_messages(thread_id)?;
        tx.commit().context("Failed to end read transaction")?;
        Ok(Some((state, messages)))
    }

    fn count_thread_messages(&self, thread_id: i64) -> CoreResult<i64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE thread_id = ?",
                params![thread_id],
                |row| row.get(0),
            )
            .context("Failed to count thread messages")?;
        Ok(count)
    }

    /// Current flag of a root, or `NotARoot`/`MessageNotFound`.
    fn root_flag(&self, root_id: i64) -> CoreResult<bool> {
        let row: Option<(Option<i64>, bool)> = self
            .conn
            .query_row(
                "SELECT parent_id, sent_to_admin FROM messages WHERE id = ?",
                params![root_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to query sent_to_admin")?;
        match row {
            None => Err(CoreError::MessageNotFound {
                message_id: root_id,
            }),
            Some((Some(_), _)) => Err(CoreError::NotARoot {
                message_id: root_id,
            }),
            Some((None, flag)) => Ok(flag),
        }
    }
}

/// Map a row selected with `MESSAGE_COLUMNS` into a `Message`.
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let created_us: i64 = row.get(7)?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(created_us)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(7, created_us))?;
    Ok(Message {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        parent_id: row.get(2)?,
        author_user_id: row.get(3)?,
        author_role: row.get(4)?,
        content: row.get(5)?,
        kind: row.get(6)?,
        created_at,
        sent_to_admin: row.get(8)?,
    })
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

// ============================================================================
// Schema SQL
// ============================================================================

const SCHEMA_SQL: &str = r"
-- MESSAGES
-- AUTOINCREMENT keeps ids strictly increasing and never reused after deletes.
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER NOT NULL,
    parent_id INTEGER,
    author_user_id INTEGER NOT NULL,
    author_role TEXT NOT NULL CHECK (author_role IN ('USER', 'ADMIN')),
    content TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'TEXT',
    created_at INTEGER NOT NULL,
    sent_to_admin INTEGER NOT NULL DEFAULT 0 CHECK (sent_to_admin IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_messages_thread_order ON messages(thread_id, created_at, id);
CREATE INDEX IF NOT EXISTS idx_messages_thread_role ON messages(thread_id, author_role);
CREATE INDEX IF NOT EXISTS idx_messages_roots_by_author
    ON messages(author_user_id, sent_to_admin, created_at) WHERE parent_id IS NULL;
CREATE INDEX IF NOT EXISTS idx_messages_roots_by_flag
    ON messages(sent_to_admin, created_at) WHERE parent_id IS NULL;
CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
";

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    pub(crate) fn setup_store() -> MessageStore {
        let store = MessageStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn test_root_defines_its_thread() {
        let store = setup_store();
        let root = store.create_root(7, "What levels exist?", None, false).unwrap();

        assert_eq!(root.id, root.thread_id);
        assert!(root.parent_id.is_none());
        assert_eq!(root.author_role, AuthorRole::User);
        assert_eq!(root.kind, "TEXT");
        assert!(!root.sent_to_admin);
    }

    #[test]
    fn test_root_can_be_escalated_at_creation() {
        let store = setup_store();
        let root = store.create_root(7, "urgent", Some("TEXT"), true).unwrap();
        assert!(root.sent_to_admin);
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Pending));
    }

    #[test]
    fn test_ids_strictly_increase() {
        let store = setup_store();
        let a = store.create_root(1, "a", None, false).unwrap();
        let b = store.create_reply(a.id, a.id, 2, AuthorRole::Admin, "b", None).unwrap();
        let c = store.create_root(3, "c", None, false).unwrap();
        assert!(a.id < b.id && b.id < c.id);
        assert!(a.created_at <= b.created_at && b.created_at <= c.created_at);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = setup_store();
        let a = store.create_root(1, "a", None, false).unwrap();
        store.delete(a.id).unwrap();
        let b = store.create_root(1, "b", None, false).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_blank_content_rejected() {
        let store = setup_store();
        let err = store.create_root(1, "   ", None, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_reply_carries_thread_id() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let reply = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "a", None)
            .unwrap();
        assert_eq!(reply.thread_id, root.id);
        assert_eq!(reply.parent_id, Some(root.id));
        assert!(!reply.sent_to_admin);
    }

    #[test]
    fn test_reply_to_unknown_thread_is_not_found() {
        let store = setup_store();
        let err = store
            .create_reply(999, 999, 1, AuthorRole::User, "x", None)
            .unwrap_err();
        assert!(matches!(err, CoreError::ThreadNotFound { thread_id: 999 }));
    }

    #[test]
    fn test_reply_to_non_root_thread_id_is_not_found() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let reply = store
            .create_reply(root.id, root.id, 7, AuthorRole::User, "r", None)
            .unwrap();
        let err = store
            .create_reply(reply.id, reply.id, 7, AuthorRole::User, "x", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_cross_thread_parent_rejected() {
        let store = setup_store();
        let a = store.create_root(1, "a", None, false).unwrap();
        let b = store.create_root(2, "b", None, false).unwrap();
        let err = store
            .create_reply(a.id, b.id, 1, AuthorRole::User, "x", None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidParent { parent_id, thread_id }
                if parent_id == b.id && thread_id == a.id
        ));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let store = setup_store();
        let a = store.create_root(1, "a", None, false).unwrap();
        let err = store
            .create_reply(a.id, 12345, 1, AuthorRole::User, "x", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParent);
    }

    #[test]
    fn test_thread_messages_ordered() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let r1 = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "a1", None)
            .unwrap();
        let r2 = store
            .create_reply(root.id, r1.id, 7, AuthorRole::User, "u1", None)
            .unwrap();
        let other = store.create_root(8, "other", None, false).unwrap();
        store
            .create_reply(other.id, other.id, 8, AuthorRole::User, "noise", None)
            .unwrap();

        let ids: Vec<i64> = store
            .thread_messages(root.id)
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![root.id, r1.id, r2.id]);
    }

    #[test]
    fn test_thread_messages_unknown_is_empty() {
        let store = setup_store();
        assert!(store.thread_messages(42).unwrap().is_empty());
        assert!(!store.root_exists(42).unwrap());
    }

    #[test]
    fn test_every_message_root_iff_parent_null() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, true).unwrap();
        let r1 = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "a", None)
            .unwrap();
        store
            .create_reply(root.id, r1.id, 7, AuthorRole::User, "b", None)
            .unwrap();
        store.create_root(9, "z", None, false).unwrap();

        let mut stmt = store
            .conn()
            .prepare(&format!("SELECT {MESSAGE_COLUMNS} FROM messages m"))
            .unwrap();
        let all: Vec<Message> = stmt
            .query_map([], message_from_row)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(all.len(), 4);
        for m in all {
            assert_eq!(m.parent_id.is_none(), m.id == m.thread_id, "{m:?}");
        }
    }

    #[test]
    fn test_delete_reply_keeps_relative_order() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let r1 = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "1", None)
            .unwrap();
        let r2 = store
            .create_reply(root.id, r1.id, 7, AuthorRole::User, "2", None)
            .unwrap();
        let r3 = store
            .create_reply(root.id, r2.id, 1, AuthorRole::Admin, "3", None)
            .unwrap();

        store.delete(r2.id).unwrap();

        let ids: Vec<i64> = store
            .thread_messages(root.id)
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![root.id, r1.id, r3.id]);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = setup_store();
        let err = store.delete(77).unwrap_err();
        assert!(matches!(err, CoreError::MessageNotFound { message_id: 77 }));
    }

    #[test]
    fn test_delete_root_orphans_replies() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let reply = store
            .create_reply(root.id, root.id, 7, AuthorRole::User, "r", None)
            .unwrap();

        store.delete(root.id).unwrap();

        assert!(!store.root_exists(root.id).unwrap());
        assert!(store.get_message(reply.id).unwrap().is_some());
        assert_eq!(store.thread_state(root.id).unwrap(), None);
        let err = store
            .create_reply(root.id, reply.id, 7, AuthorRole::User, "again", None)
            .unwrap_err();
        assert!(matches!(err, CoreError::ThreadNotFound { .. }));
    }

    #[test]
    fn test_set_sent_to_admin_idempotent() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();

        let first = store.set_sent_to_admin(root.id, true).unwrap();
        assert!(first.changed);
        let second = store.set_sent_to_admin(root.id, true).unwrap();
        assert!(!second.changed);
        assert!(store.get_message(root.id).unwrap().unwrap().sent_to_admin);
    }

    #[test]
    fn test_compare_and_set_stale_expectation_conflicts() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();

        let update = store
            .compare_and_set_sent_to_admin(root.id, false, true)
            .unwrap();
        assert!(update.changed);

        // the caller still believes the flag is false
        let err = store
            .compare_and_set_sent_to_admin(root.id, false, true)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { message_id } if message_id == root.id));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = store
            .compare_and_set_sent_to_admin(root.id, false, false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(store.get_message(root.id).unwrap().unwrap().sent_to_admin);
    }

    #[test]
    fn test_compare_and_set_matching_value_is_unchanged() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, true).unwrap();
        let update = store
            .compare_and_set_sent_to_admin(root.id, true, true)
            .unwrap();
        assert!(!update.changed);
    }

    #[test]
    fn test_compare_and_set_missing_root_is_not_found() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let reply = store
            .create_reply(root.id, root.id, 7, AuthorRole::User, "r", None)
            .unwrap();

        let err = store
            .compare_and_set_sent_to_admin(4242, false, true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store
            .compare_and_set_sent_to_admin(reply.id, false, true)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotARoot { .. }));
    }

    #[test]
    fn test_flag_flipped_by_other_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let first = MessageStore::open(&path, Duration::from_millis(500)).unwrap();
        first.init_schema().unwrap();
        let second = MessageStore::open(&path, Duration::from_millis(500)).unwrap();

        let root = first.create_root(7, "q", None, false).unwrap();
        // first reads false, then second escalates before first writes
        let seen = first.root_flag(root.id).unwrap();
        assert!(second.set_sent_to_admin(root.id, true).unwrap().changed);

        let err = first
            .compare_and_set_sent_to_admin(root.id, seen, true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // the read-then-set path treats the lost race as already done
        let update = first.set_sent_to_admin(root.id, true).unwrap();
        assert!(!update.changed);
        assert!(update.value);
    }

    #[test]
    fn test_set_sent_to_admin_rejects_reply() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        let reply = store
            .create_reply(root.id, root.id, 7, AuthorRole::User, "r", None)
            .unwrap();

        let err = store.set_sent_to_admin(reply.id, true).unwrap_err();
        assert!(matches!(err, CoreError::NotARoot { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store.set_sent_to_admin(4242, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_bulk_set_only_touches_users_roots() {
        let store = setup_store();
        let a = store.create_root(7, "a", None, false).unwrap();
        let b = store.create_root(7, "b", None, true).unwrap();
        let c = store.create_root(8, "c", None, false).unwrap();
        store
            .create_reply(c.id, c.id, 7, AuthorRole::User, "7 replying on 8's thread", None)
            .unwrap();

        let changed = store.bulk_set_sent_to_admin(7, true).unwrap();
        assert_eq!(changed, 1);
        assert!(store.get_message(a.id).unwrap().unwrap().sent_to_admin);
        assert!(store.get_message(b.id).unwrap().unwrap().sent_to_admin);
        assert!(!store.get_message(c.id).unwrap().unwrap().sent_to_admin);

        // administrative reset of the whole backlog
        let reset = store.bulk_set_sent_to_admin(7, false).unwrap();
        assert_eq!(reset, 2);
        assert_eq!(store.thread_state(a.id).unwrap(), Some(ThreadState::Draft));
    }

    #[test]
    fn test_state_transitions() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Draft));

        // a reply to a draft does not escalate
        store
            .create_reply(root.id, root.id, 7, AuthorRole::User, "more", None)
            .unwrap();
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Draft));

        store.set_sent_to_admin(root.id, true).unwrap();
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Pending));

        let answer = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "answer", None)
            .unwrap();
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Resolved));
        assert!(store.has_admin_reply(root.id).unwrap());

        store
            .create_reply(root.id, answer.id, 7, AuthorRole::User, "thanks", None)
            .unwrap();
        assert_eq!(store.thread_state(root.id).unwrap(), Some(ThreadState::Resolved));
    }

    #[test]
    fn test_thread_snapshot_state_matches_messages() {
        let store = setup_store();
        assert!(store.thread_snapshot(404).unwrap().is_none());

        let root = store.create_root(7, "q", None, true).unwrap();
        let (state, messages) = store.thread_snapshot(root.id).unwrap().unwrap();
        assert_eq!(state, ThreadState::Pending);
        assert_eq!(messages.len(), 1);

        store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "a", None)
            .unwrap();
        let (state, messages) = store.thread_snapshot(root.id).unwrap().unwrap();
        assert_eq!(state, ThreadState::Resolved);
        assert!(messages.iter().any(|m| m.author_role == AuthorRole::Admin));
    }

    #[test]
    fn test_latest_in_thread() {
        let store = setup_store();
        let root = store.create_root(7, "q", None, false).unwrap();
        assert_eq!(store.latest_in_thread(root.id).unwrap().unwrap().id, root.id);
        let reply = store
            .create_reply(root.id, root.id, 1, AuthorRole::Admin, "a", None)
            .unwrap();
        assert_eq!(store.latest_in_thread(root.id).unwrap().unwrap().id, reply.id);
        assert!(store.latest_in_thread(999).unwrap().is_none());
    }

    #[test]
    fn test_init_schema_idempotent() {
        let store = setup_store();
        store.create_root(1, "keep me", None, false).unwrap();
        store.init_schema().unwrap();
        assert_eq!(store.thread_messages(1).unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_schema_writes_only_when_behind() {
        let store = MessageStore::open_in_memory().unwrap();
        assert!(store.ensure_schema().unwrap());
        assert!(!store.ensure_schema().unwrap());
        assert_eq!(
            read_schema_version(store.conn()).unwrap(),
            CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("messages.db");
        let store = MessageStore::open(&path, Duration::from_millis(500)).unwrap();
        store.init_schema().unwrap();
        let root = store.create_root(3, "persisted", None, false).unwrap();
        drop(store);

        let reopened = MessageStore::open(&path, Duration::from_millis(500)).unwrap();
        let loaded = reopened.get_message(root.id).unwrap().unwrap();
        assert_eq!(loaded, root);
    }
}
