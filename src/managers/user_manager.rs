//! Owning-user records. Every write path ensures the user exists first.

use rusqlite::{params, Connection};

use crate::types::errors::LinkError;
use crate::types::now_millis;

/// Creates user rows on demand.
pub struct UserManager<'a> {
    conn: &'a Connection,
}

impl<'a> UserManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Creates the user if absent. Calling it again is a no-op.
    pub fn ensure_user(&self, user_id: &str) -> Result<(), LinkError> {
        if user_id.trim().is_empty() {
            return Err(LinkError::MissingUser);
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO users (id, created_at) VALUES (?1, ?2)",
            params![user_id, now_millis()],
        )?;
        Ok(())
    }

    pub fn user_exists(&self, user_id: &str) -> Result<bool, LinkError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
