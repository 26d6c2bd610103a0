//! SQLite schema for the local item store

/// Version written to `schema_version` on creation
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per item; seq preserves insertion order
CREATE TABLE IF NOT EXISTS items (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    id TEXT NOT NULL,
    item_type TEXT,
    title TEXT NOT NULL,
    data TEXT NOT NULL,
    date_added TEXT,
    date_modified TEXT,
    UNIQUE (owner, id)
);

CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner, seq);
CREATE INDEX IF NOT EXISTS idx_items_type ON items(owner, item_type);
"#
    }
}
