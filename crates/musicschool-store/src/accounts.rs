//! Accounts and the persisted sign-in session of the embedded auth provider.

use chrono::Utc;
use musicschool_backend::auth::AccountRecord;
use musicschool_shared::types::UserId;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a new account.  Returns `false` if the email is taken.
    pub fn insert_account(&self, account: &AccountRecord) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO accounts (email, uid, salt_hex, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.email,
                account.uid.as_str(),
                account.salt_hex,
                account.password_hash,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn get_account(&self, email: &str) -> Result<AccountRecord> {
        self.conn()
            .query_row(
                "SELECT email, uid, salt_hex, password_hash FROM accounts WHERE email = ?1",
                params![email],
                row_to_account,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub fn set_session(&self, email: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO auth_session (id, email) VALUES (1, ?1)",
            params![email],
        )?;
        Ok(())
    }

    /// The account of the persisted session, if any.
    pub fn get_session(&self) -> Result<Option<AccountRecord>> {
        let account = self
            .conn()
            .query_row(
                "SELECT a.email, a.uid, a.salt_hex, a.password_hash
                 FROM auth_session s JOIN accounts a ON a.email = s.email
                 WHERE s.id = 1",
                [],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.conn().execute("DELETE FROM auth_session", [])?;
        Ok(())
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        email: row.get(0)?,
        uid: UserId::new(row.get::<_, String>(1)?),
        salt_hex: row.get(2)?,
        password_hash: row.get(3)?,
    })
}
