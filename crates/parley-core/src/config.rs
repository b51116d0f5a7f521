//! Runtime configuration.
//!
//! Resolution order for each setting: explicit override, then environment
//! variable, then built-in default.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::page::DEFAULT_PAGE_SIZE;

/// Directory holding parley data under the root.
pub const DATA_DIR: &str = ".parley";

/// SQLite database filename inside `DATA_DIR`.
pub const DB_FILE: &str = "messages.db";

/// How long a writer waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Root directory override.
pub const ROOT_VAR: &str = "PARLEY_ROOT";
/// Default page size override.
pub const PAGE_SIZE_VAR: &str = "PARLEY_PAGE_SIZE";
/// Busy timeout override, in milliseconds.
pub const BUSY_TIMEOUT_VAR: &str = "PARLEY_BUSY_TIMEOUT_MS";

/// Settings shared by the service layer and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParleyConfig {
    root: PathBuf,
    default_page_size: usize,
    busy_timeout: Duration,
}

impl ParleyConfig {
    /// Configuration rooted at `root` with built-in defaults.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            default_page_size: DEFAULT_PAGE_SIZE,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Resolve configuration from an optional explicit root and the environment.
    ///
    /// The root falls back to `$PARLEY_ROOT`, then to `fallback_root`
    /// (normally the current directory).
    pub fn from_env(explicit_root: Option<&Path>, fallback_root: &Path) -> Result<Self> {
        let root = explicit_root
            .map(Path::to_path_buf)
            .or_else(|| non_empty_var(ROOT_VAR).map(PathBuf::from))
            .unwrap_or_else(|| fallback_root.to_path_buf());

        let mut config = Self::new(&root);
        if let Some(raw) = non_empty_var(PAGE_SIZE_VAR) {
            config.default_page_size = parse_page_size(&raw)?;
        }
        if let Some(raw) = non_empty_var(BUSY_TIMEOUT_VAR) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {BUSY_TIMEOUT_VAR}: {raw}"))?;
            config.busy_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.parley` directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Path to the SQLite database.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE)
    }

    #[must_use]
    pub const fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_page_size(raw: &str) -> Result<usize> {
    let size: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {PAGE_SIZE_VAR}: {raw}"))?;
    if size == 0 {
        anyhow::bail!("{PAGE_SIZE_VAR} must be a positive integer");
    }
    Ok(size)
}
