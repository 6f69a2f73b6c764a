//! v001 -- Initial schema creation.
//!
//! Creates the local key/value cache and the embedded document table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Key/value cache
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS kv (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL                  -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Documents (embedded document store)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,                 -- e.g. study_groups/group1/messages
    id         TEXT NOT NULL,
    seq        INTEGER NOT NULL,              -- first-write order
    fields     TEXT NOT NULL,                 -- JSON object
    updated_at TEXT NOT NULL,

    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection_seq
    ON documents(collection, seq);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
