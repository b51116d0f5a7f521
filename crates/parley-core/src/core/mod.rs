//! Service layer for parley-core.
//!
//! Provides typed, high-level APIs for questions, replies, threads,
//! escalation, and queue views. The service layer owns the message store
//! connection and validates input before it reaches SQL.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use parley_core::config::ParleyConfig;
//! use parley_core::core::ParleyContext;
//! use parley_core::page::PageRequest;
//!
//! let ctx = ParleyContext::new(ParleyConfig::new(Path::new("/srv/portal"))).unwrap();
//! let services = ctx.services().unwrap();
//! let todo = services.queues().admin_todo(PageRequest::first()).unwrap();
//! ```

pub mod errors;
pub mod escalation;
pub mod messages;
pub mod queues;
pub mod threads;

pub use errors::{CoreError, CoreResult, ErrorKind};

use anyhow::Context;

use crate::config::ParleyConfig;
use crate::store::MessageStore;

/// Context for parley services.
///
/// Holds the resolved configuration. Create one per process or per request;
/// each call to `services` opens its own connection.
#[derive(Debug, Clone)]
pub struct ParleyContext {
    config: ParleyConfig,
}

impl ParleyContext {
    /// Create a new context, failing if the data directory was never initialized.
    pub fn new(config: ParleyConfig) -> CoreResult<Self> {
        if !config.db_path().exists() {
            return Err(CoreError::NotInitialized {
                path: config.data_dir().display().to_string(),
            });
        }
        Ok(Self { config })
    }

    /// Create the data directory and schema, then return a context.
    ///
    /// Safe to run on an already initialized root.
    pub fn init(config: ParleyConfig) -> CoreResult<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;
        let store = MessageStore::open(&config.db_path(), config.busy_timeout())?;
        store.init_schema()?;
        tracing::info!(path = %config.db_path().display(), "initialized parley database");
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Open the message store, bringing an older schema up to date.
    pub fn open_store(&self) -> CoreResult<MessageStore> {
        let store = MessageStore::open(&self.config.db_path(), self.config.busy_timeout())?;
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create a `ParleyServices` instance backed by this context.
    pub fn services(&self) -> CoreResult<ParleyServices> {
        let store = self.open_store()?;
        Ok(ParleyServices {
            config: self.config.clone(),
            store,
        })
    }
}

/// Facade providing all parley service APIs.
pub struct ParleyServices {
    config: ParleyConfig,
    store: MessageStore,
}

impl ParleyServices {
    /// Wrap an already opened store, e.g. an in-memory one.
    #[must_use]
    pub const fn from_store(config: ParleyConfig, store: MessageStore) -> Self {
        Self { config, store }
    }

    /// Question, reply, and delete operations.
    #[must_use]
    pub const fn messages(&self) -> messages::MessageService<'_> {
        messages::MessageService::new(&self.store)
    }

    /// Thread fetch and state operations.
    #[must_use]
    pub const fn threads(&self) -> threads::ThreadService<'_> {
        threads::ThreadService::new(&self.store)
    }

    /// Escalation flag operations.
    #[must_use]
    pub const fn escalation(&self) -> escalation::EscalationService<'_> {
        escalation::EscalationService::new(&self.store)
    }

    /// To-do, history, and draft listings.
    #[must_use]
    pub const fn queues(&self) -> queues::QueueService<'_> {
        queues::QueueService::new(&self.store)
    }

    /// Get a reference to the underlying store.
    ///
    /// Useful for advanced queries not covered by the service layer.
    #[must_use]
    pub const fn store(&self) -> &MessageStore {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &ParleyConfig {
        &self.config
    }
}
