//! parley - threaded user/admin messaging over a local SQLite database

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use parley_core::config::ParleyConfig;
use parley_core::core::{CoreError, ErrorKind};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::commands::{
    run_ask, run_delete, run_escalate, run_escalate_all, run_history, run_init, run_reply,
    run_summary, run_thread_show, run_thread_state, run_todo, run_unsent, CallerArgs,
};
use cli::{Cli, Commands, ThreadCommands};

/// Environment variable holding the default log filter.
const LOG_VAR: &str = "PARLEY_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Install the stderr subscriber. An unparsable filter falls back to `warn`.
fn init_logging(level: Option<&str>) {
    let directive = level
        .map(str::to_string)
        .or_else(|| env::var(LOG_VAR).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ParleyConfig::from_env(cli.root.as_deref(), &env::current_dir()?)?;
    let format = cli.output_format();
    let caller = CallerArgs {
        user: cli.user,
        role: cli.role,
    };

    match cli.command {
        Commands::Init => run_init(&config, format)?,

        Commands::Ask {
            content,
            kind,
            escalate,
        } => run_ask(&config, caller, &content, &kind, escalate, format)?,

        Commands::Reply {
            thread_id,
            content,
            parent,
            kind,
        } => run_reply(&config, caller, thread_id, parent, &content, &kind, format)?,

        Commands::Thread(cmd) => match cmd {
            ThreadCommands::Show { thread_id } => run_thread_show(&config, thread_id, format)?,
            ThreadCommands::State { thread_id } => run_thread_state(&config, thread_id, format)?,
        },

        Commands::Unsent { paging } => run_unsent(&config, caller, paging, format)?,
        Commands::Todo { paging } => run_todo(&config, paging, format)?,
        Commands::History { paging } => run_history(&config, paging, format)?,

        Commands::Escalate { root_id, undo } => run_escalate(&config, root_id, undo, format)?,
        Commands::EscalateAll { user_id, undo } => {
            run_escalate_all(&config, caller, user_id, undo, format)?;
        }

        Commands::Delete { message_id } => run_delete(&config, message_id, format)?,

        Commands::Summary => run_summary(&config, caller, format)?,
    }

    Ok(())
}

/// Map a failure to a process exit code by error kind.
///
/// 2 invalid argument, 3 not found, 4 invalid parent, 5 conflict, 1 anything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CoreError>().map(CoreError::kind) {
        Some(ErrorKind::InvalidArgument) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::InvalidParent) => 4,
        Some(ErrorKind::Conflict) => 5,
        Some(ErrorKind::Internal) | None => 1,
    }
}
