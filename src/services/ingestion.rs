//! Batch Ingestion Coordinator.
//!
//! Drives fetch → persist for one URL (with tags) or many URLs (bulk, no
//! tags), and the fetch → overwrite/move flow for editing a link.
//!
//! Bulk saves fan out over a bounded number of concurrent fetches. Each URL
//! succeeds or fails on its own; a failed URL never rolls back a sibling.
//! Metadata failures do not count as failures at all, since the fetcher
//! degrades them to fallback records. Only persistence errors fail a URL.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::managers::link_manager::{LinkManager, LinkManagerTrait};
use crate::managers::tag_manager::{TagManager, TagManagerTrait};
use crate::services::change_feed::ChangeFeed;
use crate::services::metadata_fetcher::MetadataFetcher;
use crate::types::errors::{IngestError, LinkError};
use crate::types::ingest::{BatchReport, LinkOutcome};
use crate::types::link::{BookmarkLink, FetchOutcome};
use crate::types::Scope;

/// An edit to an existing link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkUpdate {
    pub link_id: String,
    /// The (possibly unchanged) URL; always re-scraped.
    pub request_url: String,
    /// `None` keeps the link where it is. `Some(None)` moves it to uncategorized.
    pub target_folder: Option<Option<String>>,
    /// When present, replaces the link's tags.
    pub tags: Option<Vec<String>>,
}

/// Coordinates fetching and persisting links.
pub struct IngestionCoordinator {
    db: Arc<Database>,
    fetcher: MetadataFetcher,
    feed: Arc<ChangeFeed>,
    max_concurrency: usize,
}

impl IngestionCoordinator {
    pub fn new(db: Arc<Database>, fetcher: MetadataFetcher, feed: Arc<ChangeFeed>, max_concurrency: usize) -> Self {
        Self {
            db,
            fetcher,
            feed,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn fetcher(&self) -> &MetadataFetcher {
        &self.fetcher
    }

    /// Checks that `scope` names a user and, if given, one of their folders.
    ///
    /// Runs before any fetch so a bad request performs no I/O on the web and
    /// writes nothing.
    pub fn check_scope(&self, scope: &Scope) -> Result<(), LinkError> {
        if scope.user_id.trim().is_empty() {
            return Err(LinkError::MissingUser);
        }
        if let Some(folder_id) = scope.folder() {
            let conn = self.db.connection();
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM folders WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![folder_id, scope.user_id],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Err(LinkError::FolderNotFound(folder_id.to_string()));
            }
        }
        Ok(())
    }

    /// Saves a single URL and reconciles its tags.
    pub async fn ingest_one(&self, scope: &Scope, url: &str, tags: &[String]) -> Result<BookmarkLink, IngestError> {
        self.check_scope(scope)?;
        let outcome = self.fetcher.fetch_or_fallback(url).await;

        let conn = self.db.connection();
        let mut link = self.persist(&conn, scope, outcome)?;
        if !tags.is_empty() {
            let reconciled = TagManager::new(&conn).reconcile(&scope.user_id, &link.id, scope.folder(), tags);
            if let Err(err) = reconciled {
                // The link stays saved; subscribers still see it.
                self.notify(&conn, scope);
                return Err(err.into());
            }
            link = LinkManager::new(&conn).get_link(scope, &link.id)?;
        }
        self.notify(&conn, scope);
        Ok(link)
    }

    /// Saves every URL in `urls` under `scope`.
    ///
    /// An empty list returns an empty report without touching the network or
    /// the store. `results` in the report follow the order of `urls`.
    pub async fn ingest_batch(&self, scope: &Scope, urls: &[String]) -> Result<BatchReport, LinkError> {
        if urls.is_empty() {
            return Ok(BatchReport::default());
        }
        self.check_scope(scope)?;

        let tasks: Vec<BoxFuture<'_, (usize, LinkOutcome)>> = urls
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, url)| async move { (index, self.ingest_url(scope, &url).await) }.boxed())
            .collect();
        let mut indexed: Vec<(usize, LinkOutcome)> = stream::iter(tasks)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let report = BatchReport::from_outcomes(indexed.into_iter().map(|(_, o)| o).collect());
        info!(
            user_id = %scope.user_id,
            folder_id = ?scope.folder_id,
            saved = report.saved,
            failed = report.failed,
            "batch ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_url(&self, scope: &Scope, url: &str) -> LinkOutcome {
        let outcome = self.fetcher.fetch_or_fallback(url).await;
        let used_fallback = outcome.is_fallback();

        let conn = self.db.connection();
        match self.persist(&conn, scope, outcome) {
            Ok(link) => {
                self.notify(&conn, scope);
                LinkOutcome::Saved {
                    request_url: url.to_string(),
                    link,
                    used_fallback,
                }
            }
            Err(err) => {
                warn!(url, error = %err, "failed to persist link");
                LinkOutcome::Failed {
                    request_url: url.to_string(),
                    error: err.to_string(),
                }
            }
        }
    }

    /// Edits an existing link: re-scrapes the URL, then overwrites in place
    /// or moves it to another collection.
    ///
    /// The link must exist in `scope`; otherwise `NotFound` is returned and
    /// nothing is written.
    pub async fn update_link(&self, scope: &Scope, update: LinkUpdate) -> Result<BookmarkLink, IngestError> {
        let target_folder = match &update.target_folder {
            Some(target) if target.as_deref() != scope.folder() => Some(target.clone()),
            _ => None,
        };
        {
            let conn = self.db.connection();
            LinkManager::new(&conn).get_link(scope, &update.link_id)?;
        }
        if let Some(target) = &target_folder {
            self.check_scope(&Scope::new(scope.user_id.clone(), target.clone()))?;
        }

        let outcome = self.fetcher.fetch_or_fallback(&update.request_url).await;
        let fields = outcome.into_fields();

        let conn = self.db.connection();
        let mut links = LinkManager::new(&conn);
        let (link, final_scope) = match target_folder {
            Some(target) => {
                let link = links.move_link(scope, &update.link_id, target.as_deref(), fields)?;
                debug!(link_id = %link.id, from = ?scope.folder_id, to = ?target, "moved link");
                self.notify(&conn, scope);
                (link, Scope::new(scope.user_id.clone(), target))
            }
            None => (
                links.overwrite_metadata(scope, &update.link_id, fields)?,
                scope.clone(),
            ),
        };

        let link = match &update.tags {
            Some(names) => {
                TagManager::new(&conn).reconcile(&final_scope.user_id, &link.id, final_scope.folder(), names)?;
                links.get_link(&final_scope, &link.id)?
            }
            None => link,
        };
        self.notify(&conn, &final_scope);
        Ok(link)
    }

    /// Deletes a link by id, or by URL when no id is given.
    pub fn delete_link(&self, scope: &Scope, link_id: Option<&str>, request_url: Option<&str>) -> Result<String, LinkError> {
        let conn = self.db.connection();
        let mut links = LinkManager::new(&conn);
        let id = match (link_id, request_url) {
            (Some(id), _) => id.to_string(),
            (None, Some(url)) => links
                .find_by_request_url(scope, url)?
                .map(|link| link.id)
                .ok_or_else(|| LinkError::NotFound(url.to_string()))?,
            (None, None) => return Err(LinkError::NotFound(String::new())),
        };
        links.delete_link(scope, &id)?;
        self.notify(&conn, scope);
        Ok(id)
    }

    fn persist(&self, conn: &Connection, scope: &Scope, outcome: FetchOutcome) -> Result<BookmarkLink, LinkError> {
        let link = LinkManager::new(conn).insert_link(scope, outcome.into_fields())?;
        debug!(link_id = %link.id, url = %link.request_url, "persisted link");
        Ok(link)
    }

    /// Publishes a snapshot of `scope`. A failed snapshot never fails the write.
    pub fn notify(&self, conn: &Connection, scope: &Scope) {
        if let Err(err) = self.feed.publish(conn, scope) {
            warn!(error = %err, "failed to publish collection change");
        }
    }
}
