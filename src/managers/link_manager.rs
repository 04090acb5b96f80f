//! Link Manager for linkvault.
//!
//! Implements `LinkManagerTrait`, the persistence half of the ingestion
//! pipeline: writing fetched-or-fallback link records into a user's folder or
//! uncategorized collection, locating them again, and moving them between
//! collections. Backed by SQLite via `rusqlite`.
//!
//! Collections are addressed with `folder_id IS ?`, which matches both a
//! concrete folder and the NULL uncategorized bucket.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::managers::user_manager::UserManager;
use crate::services::url_normalizer::trim_trailing_slash;
use crate::types::errors::LinkError;
use crate::types::link::{BookmarkLink, LinkFields, OgImage};
use crate::types::{now_millis, Scope};

const LINK_COLUMNS: &str = "id, request_url, og_title, og_description, og_url, og_image, favicon, \
                            folder_id, created_at, updated_at";

/// Trait defining link persistence operations.
pub trait LinkManagerTrait {
    /// Writes a new link under `scope` and returns it with its fresh id.
    fn insert_link(&mut self, scope: &Scope, fields: LinkFields) -> Result<BookmarkLink, LinkError>;
    fn get_link(&self, scope: &Scope, link_id: &str) -> Result<BookmarkLink, LinkError>;
    /// First (oldest) link in `scope` whose URL matches, ignoring one trailing slash.
    fn find_by_request_url(&self, scope: &Scope, url: &str) -> Result<Option<BookmarkLink>, LinkError>;
    /// Replaces the metadata of an existing link, keeping its id and creation time.
    fn overwrite_metadata(&mut self, scope: &Scope, link_id: &str, fields: LinkFields) -> Result<BookmarkLink, LinkError>;
    /// Moves a link to `target_folder` and rewrites its metadata in one transaction.
    fn move_link(
        &mut self,
        scope: &Scope,
        link_id: &str,
        target_folder: Option<&str>,
        fields: LinkFields,
    ) -> Result<BookmarkLink, LinkError>;
    fn delete_link(&mut self, scope: &Scope, link_id: &str) -> Result<(), LinkError>;
    /// Lists a collection, optionally filtered by a case-insensitive substring.
    fn list_links(&self, scope: &Scope, query: Option<&str>) -> Result<Vec<BookmarkLink>, LinkError>;
    /// Replaces the link's own tag set.
    fn set_link_tags(&mut self, link_id: &str, tag_ids: &[String]) -> Result<(), LinkError>;
}

/// Replaces the tag set of `link_id` without opening a transaction of its own.
///
/// Fails with a foreign-key error if the link does not exist.
pub(crate) fn write_link_tags(conn: &Connection, link_id: &str, tag_ids: &[String]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM link_tags WHERE link_id = ?1", params![link_id])?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO link_tags (link_id, tag_id) VALUES (?1, ?2)",
            params![link_id, tag_id],
        )?;
    }
    conn.execute(
        "UPDATE links SET updated_at = ?1 WHERE id = ?2",
        params![now_millis(), link_id],
    )?;
    Ok(())
}

/// Link manager backed by a SQLite connection.
pub struct LinkManager<'a> {
    conn: &'a Connection,
}

impl<'a> LinkManager<'a> {
    /// Creates a new `LinkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Checks whether `folder_id` exists and belongs to `user_id`.
    fn folder_exists(&self, user_id: &str, folder_id: &str) -> Result<bool, LinkError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM folders WHERE id = ?1 AND user_id = ?2",
            params![folder_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn require_folder(&self, user_id: &str, folder_id: Option<&str>) -> Result<(), LinkError> {
        if let Some(fid) = folder_id {
            if !self.folder_exists(user_id, fid)? {
                return Err(LinkError::FolderNotFound(fid.to_string()));
            }
        }
        Ok(())
    }

    fn encode_images(images: &[OgImage]) -> Result<String, LinkError> {
        serde_json::to_string(images).map_err(|e| LinkError::DatabaseError(e.to_string()))
    }

    /// Reads a single link row into a struct. Tags are filled in separately.
    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<BookmarkLink> {
        let images: String = row.get(5)?;
        let og_image: Vec<OgImage> = serde_json::from_str(&images).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(BookmarkLink {
            id: row.get(0)?,
            request_url: row.get(1)?,
            og_title: row.get(2)?,
            og_description: row.get(3)?,
            og_url: row.get(4)?,
            og_image,
            favicon: row.get(6)?,
            folder_id: row.get(7)?,
            tags: Vec::new(),
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn tags_for(&self, link_id: &str) -> Result<Vec<String>, LinkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag_id FROM link_tags WHERE link_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![link_id], |row| row.get(0))?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    /// Case-insensitive substring match over URL, title and description.
    /// `needle` must already be lowercased.
    fn matches(link: &BookmarkLink, needle: &str) -> bool {
        [&link.request_url, &link.og_title, &link.og_description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    fn with_tags(&self, mut link: BookmarkLink) -> Result<BookmarkLink, LinkError> {
        link.tags = self.tags_for(&link.id)?;
        Ok(link)
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<BookmarkLink>, LinkError> {
        let link = self
            .conn
            .query_row(sql, params, Self::row_to_link)
            .optional()?;
        link.map(|l| self.with_tags(l)).transpose()
    }
}

impl<'a> LinkManagerTrait for LinkManager<'a> {
    fn insert_link(&mut self, scope: &Scope, fields: LinkFields) -> Result<BookmarkLink, LinkError> {
        UserManager::new(self.conn).ensure_user(&scope.user_id)?;
        self.require_folder(&scope.user_id, scope.folder())?;

        let id = Uuid::new_v4().to_string();
        let now = now_millis();
        let images = Self::encode_images(&fields.og_image)?;

        self.conn.execute(
            "INSERT INTO links (id, user_id, folder_id, request_url, og_title, og_description, og_url, og_image, favicon, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                scope.user_id,
                scope.folder_id,
                fields.request_url,
                fields.og_title,
                fields.og_description,
                fields.og_url,
                images,
                fields.favicon,
                now,
                now
            ],
        )?;

        Ok(BookmarkLink {
            id,
            request_url: fields.request_url,
            og_title: fields.og_title,
            og_description: fields.og_description,
            og_url: fields.og_url,
            og_image: fields.og_image,
            favicon: fields.favicon,
            folder_id: scope.folder_id.clone(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_link(&self, scope: &Scope, link_id: &str) -> Result<BookmarkLink, LinkError> {
        let sql = format!(
            "SELECT {} FROM links WHERE id = ?1 AND user_id = ?2 AND folder_id IS ?3",
            LINK_COLUMNS
        );
        self.query_one(&sql, params![link_id, scope.user_id, scope.folder_id])?
            .ok_or_else(|| LinkError::NotFound(link_id.to_string()))
    }

    fn find_by_request_url(&self, scope: &Scope, url: &str) -> Result<Option<BookmarkLink>, LinkError> {
        let key = trim_trailing_slash(url.trim());
        let with_slash = format!("{}/", key);
        let sql = format!(
            "SELECT {} FROM links WHERE user_id = ?1 AND folder_id IS ?2 \
             AND (request_url = ?3 OR request_url = ?4) ORDER BY created_at, rowid LIMIT 1",
            LINK_COLUMNS
        );
        self.query_one(&sql, params![scope.user_id, scope.folder_id, key, with_slash])
    }

    fn overwrite_metadata(&mut self, scope: &Scope, link_id: &str, fields: LinkFields) -> Result<BookmarkLink, LinkError> {
        let images = Self::encode_images(&fields.og_image)?;
        let affected = self.conn.execute(
            "UPDATE links SET request_url = ?1, og_title = ?2, og_description = ?3, og_url = ?4, \
             og_image = ?5, favicon = ?6, updated_at = ?7 \
             WHERE id = ?8 AND user_id = ?9 AND folder_id IS ?10",
            params![
                fields.request_url,
                fields.og_title,
                fields.og_description,
                fields.og_url,
                images,
                fields.favicon,
                now_millis(),
                link_id,
                scope.user_id,
                scope.folder_id
            ],
        )?;

        if affected == 0 {
            return Err(LinkError::NotFound(link_id.to_string()));
        }
        self.get_link(scope, link_id)
    }

    fn move_link(
        &mut self,
        scope: &Scope,
        link_id: &str,
        target_folder: Option<&str>,
        fields: LinkFields,
    ) -> Result<BookmarkLink, LinkError> {
        let images = Self::encode_images(&fields.og_image)?;
        let tx = self.conn.unchecked_transaction()?;

        self.require_folder(&scope.user_id, target_folder)?;

        // Leaving the source collection and entering the target is a single
        // row update, so no reader can see the link in both or neither.
        let affected = tx.execute(
            "UPDATE links SET folder_id = ?1, request_url = ?2, og_title = ?3, og_description = ?4, \
             og_url = ?5, og_image = ?6, favicon = ?7, updated_at = ?8 \
             WHERE id = ?9 AND user_id = ?10 AND folder_id IS ?11",
            params![
                target_folder,
                fields.request_url,
                fields.og_title,
                fields.og_description,
                fields.og_url,
                images,
                fields.favicon,
                now_millis(),
                link_id,
                scope.user_id,
                scope.folder_id
            ],
        )?;

        if affected == 0 {
            return Err(LinkError::NotFound(link_id.to_string()));
        }
        tx.commit()?;

        let target = Scope::new(scope.user_id.clone(), target_folder.map(str::to_string));
        self.get_link(&target, link_id)
    }

    fn delete_link(&mut self, scope: &Scope, link_id: &str) -> Result<(), LinkError> {
        let affected = self.conn.execute(
            "DELETE FROM links WHERE id = ?1 AND user_id = ?2 AND folder_id IS ?3",
            params![link_id, scope.user_id, scope.folder_id],
        )?;

        if affected == 0 {
            return Err(LinkError::NotFound(link_id.to_string()));
        }
        Ok(())
    }

    fn list_links(&self, scope: &Scope, query: Option<&str>) -> Result<Vec<BookmarkLink>, LinkError> {
        let needle = query.map(str::trim).filter(|q| !q.is_empty()).map(str::to_lowercase);
        let sql = format!(
            "SELECT {} FROM links WHERE user_id = ?1 AND folder_id IS ?2 ORDER BY created_at, rowid",
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![scope.user_id, scope.folder_id], Self::row_to_link)?;

        let mut results = Vec::new();
        for row in rows {
            let link = row?;
            if let Some(needle) = &needle {
                if !Self::matches(&link, needle) {
                    continue;
                }
            }
            results.push(self.with_tags(link)?);
        }
        Ok(results)
    }

    fn set_link_tags(&mut self, link_id: &str, tag_ids: &[String]) -> Result<(), LinkError> {
        let tx = self.conn.unchecked_transaction()?;
        write_link_tags(&tx, link_id, tag_ids)?;
        tx.commit()?;
        Ok(())
    }
}
