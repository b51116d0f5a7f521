//! Command implementations.

pub mod escalate;
pub mod helpers;
pub mod init;
pub mod messages;
pub mod queues;
pub mod threads;

pub use escalate::{run_escalate, run_escalate_all};
pub use helpers::CallerArgs;
pub use init::run_init;
pub use messages::{run_ask, run_delete, run_reply};
pub use queues::{run_history, run_summary, run_todo, run_unsent};
pub use threads::{run_thread_show, run_thread_state};
