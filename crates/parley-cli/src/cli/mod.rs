//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_core::message::AuthorRole;

use crate::output::OutputFormat;

pub mod commands;

/// Threaded user/admin messaging: questions, escalation, to-do and history queues
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory containing .parley/ (default: $PARLEY_ROOT or current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Caller user id (default: $PARLEY_USER)
    #[arg(long, global = true)]
    pub user: Option<i64>,

    /// Caller role claim (default: $PARLEY_ROLE or user)
    #[arg(long, global = true, value_enum)]
    pub role: Option<AuthorRole>,

    /// Log filter, e.g. "debug" or "parley_core=trace" (default: $PARLEY_LOG or warn)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the .parley directory and message database
    Init,

    /// Ask a new question (creates a thread)
    Ask {
        /// Question text
        content: String,

        /// Content kind tag
        #[arg(long = "type", default_value = "TEXT")]
        kind: String,

        /// Send to administrators immediately
        #[arg(long)]
        escalate: bool,
    },

    /// Reply inside a thread
    Reply {
        /// Thread ID (the root message ID)
        thread_id: i64,

        /// Reply text
        content: String,

        /// Message being replied to (default: newest message in the thread)
        #[arg(long)]
        parent: Option<i64>,

        /// Content kind tag
        #[arg(long = "type", default_value = "TEXT")]
        kind: String,
    },

    /// Inspect threads
    #[command(subcommand)]
    Thread(ThreadCommands),

    /// List your questions not yet sent to administrators
    Unsent {
        #[command(flatten)]
        paging: PagingArgs,
    },

    /// List escalated questions awaiting an admin reply (oldest first)
    Todo {
        #[command(flatten)]
        paging: PagingArgs,
    },

    /// List escalated questions that have an admin reply (newest first)
    History {
        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Send one thread to administrators
    Escalate {
        /// Root message ID
        root_id: i64,

        /// Clear the flag instead of setting it
        #[arg(long)]
        undo: bool,
    },

    /// Send every question of a user to administrators
    EscalateAll {
        /// Whose questions (default: the caller)
        #[arg(long)]
        user_id: Option<i64>,

        /// Clear the flag on the user's whole backlog instead
        #[arg(long)]
        undo: bool,
    },

    /// Permanently delete one message (replies of a deleted root are kept)
    Delete {
        /// Message ID
        message_id: i64,
    },

    /// Show queue counts
    Summary,
}

#[derive(Subcommand, Debug)]
pub enum ThreadCommands {
    /// Show all messages of a thread, oldest first
    Show {
        /// Thread ID
        thread_id: i64,
    },

    /// Show the derived state of a thread (draft, pending, resolved)
    State {
        /// Thread ID
        thread_id: i64,
    },
}

/// Page selection shared by listing commands.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PagingArgs {
    /// 0-based page index
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Page size (default: $PARLEY_PAGE_SIZE or 20)
    #[arg(long)]
    pub size: Option<usize>,
}
