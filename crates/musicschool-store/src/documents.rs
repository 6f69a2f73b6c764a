//! CRUD operations for the embedded `documents` table.
//!
//! Documents are stored as JSON text.  Filtering happens in the caller
//! (see `musicschool_backend::Query::apply`); this layer only guarantees
//! that a collection is returned in first-write order.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use crate::database::Database;
use crate::error::Result;

impl Database {
    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Create or overwrite a document, keeping its original write order.
    pub fn put_document(&self, collection: &str, id: &str, fields: &Value) -> Result<()> {
        let json = serde_json::to_string(fields)?;
        self.conn().execute(
            "INSERT INTO documents (collection, id, seq, fields, updated_at)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM documents), ?3, ?4)
             ON CONFLICT(collection, id) DO UPDATE
                SET fields = excluded.fields, updated_at = excluded.updated_at",
            params![collection, id, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// All documents of a collection as `(id, fields)`, in write order.
    pub fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, fields FROM documents
             WHERE collection = ?1
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, json) = row?;
            docs.push((id, serde_json::from_str(&json)?));
        }
        Ok(docs)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a document.  Returns `true` if a row was deleted.
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overwrite_keeps_write_order() {
        let db = Database::open_in_memory().unwrap();
        db.put_document("c", "b", &json!({"v": 1})).unwrap();
        db.put_document("c", "a", &json!({"v": 2})).unwrap();
        db.put_document("c", "b", &json!({"v": 3})).unwrap();
        db.put_document("other", "z", &json!({"v": 4})).unwrap();

        let docs = db.list_documents("c").unwrap();
        let ids: Vec<_> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(docs[0].1["v"], 3);
    }

    #[test]
    fn get_and_delete() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_document("c", "1").unwrap().is_none());

        db.put_document("c", "1", &json!({"name": "Ana"})).unwrap();
        assert_eq!(db.get_document("c", "1").unwrap().unwrap()["name"], "Ana");

        assert!(db.delete_document("c", "1").unwrap());
        assert!(db.get_document("c", "1").unwrap().is_none());
    }
}
