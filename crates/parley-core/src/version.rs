//! Database schema version detection and enforcement.
//!
//! The schema version lives in SQLite's `user_version` pragma:
//! - 0: fresh database, schema not created yet
//! - 1: `messages` table with integer-microsecond timestamps
//!
//! Opening a database stamped with a newer version is refused rather than
//! risking writes the newer schema does not expect.

use anyhow::Context;
use rusqlite::Connection;

use crate::core::{CoreError, CoreResult};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Read the schema version stamped on the database.
pub fn read_schema_version(conn: &Connection) -> CoreResult<u32> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read user_version")?;
    Ok(version)
}

/// Stamp the database with the current schema version.
pub(crate) fn write_schema_version(conn: &Connection) -> CoreResult<()> {
    conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("Failed to write user_version")?;
    Ok(())
}

/// Fail if the database was written by a newer schema.
///
/// Version 0 (fresh) and older versions pass; `init_schema` brings them up.
pub fn require_supported(conn: &Connection) -> CoreResult<()> {
    let found = read_schema_version(conn)?;
    if found > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchema {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    Ok(())
}
