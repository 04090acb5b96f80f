//! Schema migrations for the linkvault SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

use crate::types::now_millis;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Enable WAL and foreign keys (always, not versioned)
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: users, folders, links, tags")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Index links by request_url for URL lookups")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now_millis(), description],
    )?;
    Ok(())
}

/// V1: Create all core tables.
///
/// Tag back-reference tables carry no foreign keys: references to deleted
/// links and folders are kept.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS folders (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_folders_user ON folders(user_id);

        CREATE TABLE IF NOT EXISTS links (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            folder_id TEXT,
            request_url TEXT NOT NULL,
            og_title TEXT NOT NULL DEFAULT '',
            og_description TEXT NOT NULL DEFAULT '',
            og_url TEXT,
            og_image TEXT NOT NULL DEFAULT '[]',
            favicon TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (folder_id) REFERENCES folders(id)
        );

        CREATE INDEX IF NOT EXISTS idx_links_collection ON links(user_id, folder_id);

        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(user_id, name);

        CREATE TABLE IF NOT EXISTS link_tags (
            link_id TEXT NOT NULL,
            tag_id TEXT NOT NULL,
            PRIMARY KEY (link_id, tag_id),
            FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS tag_links (
            tag_id TEXT NOT NULL,
            link_id TEXT NOT NULL,
            PRIMARY KEY (tag_id, link_id)
        );

        CREATE TABLE IF NOT EXISTS tag_folders (
            tag_id TEXT NOT NULL,
            folder_id TEXT NOT NULL,
            PRIMARY KEY (tag_id, folder_id)
        );
        ",
    )
}

/// V2: URL lookup index for edit/delete-by-URL.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_links_request_url ON links(user_id, request_url);",
    )
}
