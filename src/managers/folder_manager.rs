//! Folder Manager for linkvault.
//!
//! Folders are flat, per-user collections of links. Deleting a folder
//! deletes every link in it.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::managers::user_manager::UserManager;
use crate::types::errors::FolderError;
use crate::types::folder::Folder;
use crate::types::now_millis;

/// Trait defining folder management operations.
pub trait FolderManagerTrait {
    fn create_folder(&mut self, user_id: &str, name: &str) -> Result<Folder, FolderError>;
    fn get_folder(&self, user_id: &str, folder_id: &str) -> Result<Folder, FolderError>;
    fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>, FolderError>;
    fn rename_folder(&mut self, user_id: &str, folder_id: &str, name: &str) -> Result<Folder, FolderError>;
    /// Deletes the folder and its links. Returns how many links were removed.
    fn delete_folder(&mut self, user_id: &str, folder_id: &str) -> Result<usize, FolderError>;
}

/// Derives a URL-safe slug: lowercase ASCII alphanumeric runs joined by `-`.
///
/// Not unique: two folders named "Read Later" and "read-later" share a slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Folder manager backed by a SQLite connection.
pub struct FolderManager<'a> {
    conn: &'a Connection,
}

impl<'a> FolderManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_folder(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn clean_name(name: &str) -> Result<&str, FolderError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FolderError::InvalidName(name.to_string()));
        }
        Ok(trimmed)
    }
}

impl<'a> FolderManagerTrait for FolderManager<'a> {
    fn create_folder(&mut self, user_id: &str, name: &str) -> Result<Folder, FolderError> {
        let name = Self::clean_name(name)?;
        UserManager::new(self.conn).ensure_user(user_id)?;

        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slugify(name),
            created_at: now_millis(),
        };

        self.conn.execute(
            "INSERT INTO folders (id, user_id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![folder.id, user_id, folder.name, folder.slug, folder.created_at],
        )?;

        Ok(folder)
    }

    fn get_folder(&self, user_id: &str, folder_id: &str) -> Result<Folder, FolderError> {
        self.conn
            .query_row(
                "SELECT id, name, slug, created_at FROM folders WHERE id = ?1 AND user_id = ?2",
                params![folder_id, user_id],
                Self::row_to_folder,
            )
            .optional()?
            .ok_or_else(|| FolderError::NotFound(folder_id.to_string()))
    }

    fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>, FolderError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, created_at FROM folders WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![user_id], Self::row_to_folder)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn rename_folder(&mut self, user_id: &str, folder_id: &str, name: &str) -> Result<Folder, FolderError> {
        let name = Self::clean_name(name)?;
        let affected = self.conn.execute(
            "UPDATE folders SET name = ?1, slug = ?2 WHERE id = ?3 AND user_id = ?4",
            params![name, slugify(name), folder_id, user_id],
        )?;

        if affected == 0 {
            return Err(FolderError::NotFound(folder_id.to_string()));
        }
        self.get_folder(user_id, folder_id)
    }

    fn delete_folder(&mut self, user_id: &str, folder_id: &str) -> Result<usize, FolderError> {
        let tx = self.conn.unchecked_transaction()?;

        let removed = tx.execute(
            "DELETE FROM links WHERE folder_id = ?1 AND user_id = ?2",
            params![folder_id, user_id],
        )?;
        let affected = tx.execute(
            "DELETE FROM folders WHERE id = ?1 AND user_id = ?2",
            params![folder_id, user_id],
        )?;

        if affected == 0 {
            return Err(FolderError::NotFound(folder_id.to_string()));
        }
        tx.commit()?;
        Ok(removed)
    }
}
