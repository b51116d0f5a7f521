//! Typed error types for the parley-core service layer.

use thiserror::Error;

/// Result type alias for core service operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse error classification exposed to callers.
///
/// Every kind except `Internal` is recoverable by the caller: retry, or
/// surface the problem to the human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidParent,
    InvalidArgument,
    Conflict,
    Internal,
}

/// Errors that can occur in the parley-core service layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The parley data directory has not been created.
    #[error("No parley database at {path}. Run 'parley init' first.")]
    NotInitialized { path: String },

    /// The database was written by a newer schema than this build understands.
    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// A message was not found.
    #[error("Message not found: {message_id}")]
    MessageNotFound { message_id: i64 },

    /// No root message exists for the thread.
    #[error("Thread not found: {thread_id}")]
    ThreadNotFound { thread_id: i64 },

    /// The message exists but is not a thread root.
    #[error("Message {message_id} is not a root message")]
    NotARoot { message_id: i64 },

    /// A reply targeted a parent outside its claimed thread.
    #[error("Parent message {parent_id} does not belong to thread {thread_id}")]
    InvalidParent { parent_id: i64, thread_id: i64 },

    /// Malformed input such as a zero page size or blank content.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A compare-and-set on the escalation flag lost a race. Retry.
    #[error("Concurrent update of sent_to_admin on message {message_id}; retry")]
    Conflict { message_id: i64 },

    /// An internal storage or database error.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Classify this error into the caller-facing taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MessageNotFound { .. } | Self::ThreadNotFound { .. } | Self::NotARoot { .. } => {
                ErrorKind::NotFound
            }
            Self::InvalidParent { .. } => ErrorKind::InvalidParent,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotInitialized { .. } | Self::UnsupportedSchema { .. } | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoreError::NotARoot { message_id: 3 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::InvalidParent {
                parent_id: 1,
                thread_id: 2
            }
            .kind(),
            ErrorKind::InvalidParent
        );
        assert_eq!(CoreError::invalid("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            CoreError::Conflict { message_id: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::from(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_name_ids() {
        let err = CoreError::InvalidParent {
            parent_id: 9,
            thread_id: 4,
        };
        assert_eq!(
            err.to_string(),
            "Parent message 9 does not belong to thread 4"
        );
    }
}
