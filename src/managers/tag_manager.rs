//! Tag Manager for linkvault.
//!
//! Reconciles tag names into tag records: each name resolves to exactly one
//! tag (the oldest exact, case-sensitive match, or a newly created one), the
//! tag gains back-references to the link and folder, and the link's own tag
//! set is replaced by the resolved ids.
//!
//! Back-references are only ever added. Deleting a link or folder, or
//! dropping a tag from a link, leaves the old reference in place.

use ring::rand::{SecureRandom, SystemRandom};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::managers::link_manager::write_link_tags;
use crate::types::errors::TagError;
use crate::types::now_millis;
use crate::types::tag::{Tag, TAG_PALETTE};

/// Trait defining tag reconciliation operations.
pub trait TagManagerTrait {
    /// Resolves `names` to tag ids, links them to `link_id`/`folder_id`, and
    /// overwrites the link's tag set. Returns the ids in first-seen order.
    fn reconcile(
        &mut self,
        user_id: &str,
        link_id: &str,
        folder_id: Option<&str>,
        names: &[String],
    ) -> Result<Vec<String>, TagError>;
    fn find_by_name(&self, user_id: &str, name: &str) -> Result<Option<String>, TagError>;
    fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>, TagError>;
    fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>, TagError>;
}

type TagRow = (String, String, String, i64);

fn row_to_tag_row(row: &rusqlite::Row) -> rusqlite::Result<TagRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// Picks a palette colour uniformly at random.
pub fn random_color(rng: &dyn SecureRandom) -> Result<&'static str, TagError> {
    let mut byte = [0u8; 1];
    rng.fill(&mut byte).map_err(|_| TagError::Random)?;
    // 256 is a multiple of the palette size, so the modulo is unbiased
    Ok(TAG_PALETTE[byte[0] as usize % TAG_PALETTE.len()])
}

/// Tag manager backed by a SQLite connection.
pub struct TagManager<'a> {
    conn: &'a Connection,
    rng: SystemRandom,
}

impl<'a> TagManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            rng: SystemRandom::new(),
        }
    }

    fn create_tag(&self, user_id: &str, name: &str) -> Result<String, TagError> {
        let id = Uuid::new_v4().to_string();
        let color = random_color(&self.rng)?;
        self.conn.execute(
            "INSERT INTO tags (id, user_id, name, color, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, name, color, now_millis()],
        )?;
        Ok(id)
    }

    fn add_references(&self, tag_id: &str, link_id: &str, folder_id: Option<&str>) -> Result<(), TagError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO tag_links (tag_id, link_id) VALUES (?1, ?2)",
            params![tag_id, link_id],
        )?;
        if let Some(fid) = folder_id {
            self.conn.execute(
                "INSERT OR IGNORE INTO tag_folders (tag_id, folder_id) VALUES (?1, ?2)",
                params![tag_id, fid],
            )?;
        }
        Ok(())
    }

    fn references(&self, sql: &str, tag_id: &str) -> Result<Vec<String>, TagError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![tag_id], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn hydrate(&self, id: String, name: String, color: String, created_at: i64) -> Result<Tag, TagError> {
        let links = self.references("SELECT link_id FROM tag_links WHERE tag_id = ?1 ORDER BY rowid", &id)?;
        let folders = self.references("SELECT folder_id FROM tag_folders WHERE tag_id = ?1 ORDER BY rowid", &id)?;
        Ok(Tag {
            id,
            name,
            color,
            links,
            folders,
            created_at,
        })
    }
}

impl<'a> TagManagerTrait for TagManager<'a> {
    fn reconcile(
        &mut self,
        user_id: &str,
        link_id: &str,
        folder_id: Option<&str>,
        names: &[String],
    ) -> Result<Vec<String>, TagError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut tag_ids: Vec<String> = Vec::new();

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let tag_id = match self.find_by_name(user_id, name)? {
                Some(existing) => existing,
                None => self.create_tag(user_id, name)?,
            };
            self.add_references(&tag_id, link_id, folder_id)?;
            if !tag_ids.contains(&tag_id) {
                tag_ids.push(tag_id);
            }
        }

        write_link_tags(&tx, link_id, &tag_ids)?;

        tx.commit()?;
        Ok(tag_ids)
    }

    fn find_by_name(&self, user_id: &str, name: &str) -> Result<Option<String>, TagError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM tags WHERE user_id = ?1 AND name = ?2 ORDER BY created_at, rowid LIMIT 1",
                params![user_id, name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_tag(&self, tag_id: &str) -> Result<Option<Tag>, TagError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, color, created_at FROM tags WHERE id = ?1",
                params![tag_id],
                row_to_tag_row,
            )
            .optional()?;
        row.map(|(id, name, color, created_at)| self.hydrate(id, name, color, created_at))
            .transpose()
    }

    fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>, TagError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at FROM tags WHERE user_id = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_tag_row)?;

        let mut tags = Vec::new();
        for row in rows {
            let (id, name, color, created_at) = row?;
            tags.push(self.hydrate(id, name, color, created_at)?);
        }
        Ok(tags)
    }
}
