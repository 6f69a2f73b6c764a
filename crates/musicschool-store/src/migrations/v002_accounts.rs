use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    email         TEXT PRIMARY KEY NOT NULL,  -- lower-cased
    uid           TEXT NOT NULL UNIQUE,
    salt_hex      TEXT NOT NULL,
    password_hash TEXT NOT NULL,              -- hex BLAKE3 derived key
    created_at    TEXT NOT NULL
);

-- Signed-in account, survives restarts
CREATE TABLE IF NOT EXISTS auth_session (
    id    INTEGER PRIMARY KEY CHECK (id = 1),
    email TEXT NOT NULL,
    FOREIGN KEY (email) REFERENCES accounts(email) ON DELETE CASCADE
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
