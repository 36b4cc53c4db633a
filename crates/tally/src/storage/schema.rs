//! `SQLite` schema definitions for tally.

/// SQL statement to create the total table.
pub const CREATE_TOTAL_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS total (
    id INTEGER PRIMARY KEY NOT NULL,
    value INTEGER NOT NULL,
    last_updated TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_TOTAL_TABLE, CREATE_METADATA_TABLE];

/// Application tables dropped on a destructive reset.
///
/// `metadata` is not listed; it only carries the schema version.
pub const APPLICATION_TABLES: &[&str] = &["total"];
