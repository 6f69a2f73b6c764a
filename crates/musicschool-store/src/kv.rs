//! Raw access to the `kv` table.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a value.
    pub fn kv_put(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete a key.  Returns `true` if a row was deleted.
    pub fn kv_remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Keys starting with `prefix`, sorted.
    pub fn kv_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC")?;
        let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_replace_remove() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.kv_get("a").unwrap(), None);

        db.kv_put("a", "1").unwrap();
        db.kv_put("a", "2").unwrap();
        assert_eq!(db.kv_get("a").unwrap().as_deref(), Some("2"));

        assert!(db.kv_remove("a").unwrap());
        assert!(!db.kv_remove("a").unwrap());
    }

    #[test]
    fn prefix_listing() {
        let db = Database::open_in_memory().unwrap();
        db.kv_put("x-1", "a").unwrap();
        db.kv_put("x-2", "b").unwrap();
        db.kv_put("y-1", "c").unwrap();
        assert_eq!(db.kv_keys("x-").unwrap(), vec!["x-1", "x-2"]);
    }
}
