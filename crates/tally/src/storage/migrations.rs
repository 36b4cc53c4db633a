//! Schema versioning for tally.
//!
//! There is no incremental migration path. When the stored schema version
//! differs from [`CURRENT_VERSION`], every application table is dropped and
//! recreated, discarding the saved total.

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::schema::{APPLICATION_TABLES, CREATE_METADATA_TABLE, SCHEMA_STATEMENTS};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// A fresh database gets the base schema and the current version. A database
/// written under another version is reset destructively.
///
/// # Errors
///
/// Returns an error if schema creation or the reset fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    match get_schema_version(conn)? {
        Some(CURRENT_VERSION) => {
            create_tables(conn)?;
        }
        Some(found) => {
            warn!(
                "Schema version {} does not match {}, resetting database",
                found, CURRENT_VERSION
            );
            reset(conn)?;
        }
        None => {
            debug!("Fresh database, creating schema v{}", CURRENT_VERSION);
            create_tables(conn)?;
        }
    }

    set_schema_version(conn, CURRENT_VERSION)
}

fn create_tables(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

/// Drop every application table and recreate the schema.
fn reset(conn: &Connection) -> Result<()> {
    for table in APPLICATION_TABLES {
        conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    }
    create_tables(conn)
}

/// Get the schema version stored in the database, if any.
fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::DatabaseMigration {
                message: format!("invalid schema version: {value}"),
            }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
