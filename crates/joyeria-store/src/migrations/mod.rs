//! Schema versioning.
//!
//! The schema version lives in SQLite's `user_version` pragma. Opening a
//! [`Database`](crate::Database) applies every step above the stored version,
//! in order, and records each one as it completes.

pub mod v001_initial;
pub mod v002_seller_guard;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

/// Ordered upgrade steps; entry `i` moves the schema to version `i + 1`.
const STEPS: &[(&str, Step)] = &[
    ("v001_initial", v001_initial::up),
    ("v002_seller_guard", v002_seller_guard::up),
];

pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let stored: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if stored >= CURRENT_VERSION {
        tracing::debug!(version = stored, "schema up to date");
        return Ok(());
    }

    for (version, (name, up)) in (1u32..).zip(STEPS).skip(stored as usize) {
        tracing::info!(migration = name, version, "upgrading schema");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
