//! Change notifications for live collection views.
//!
//! Every write to a collection bumps that collection's sequence number and
//! publishes the full, current snapshot of the collection (not a diff) to all
//! subscribers. Snapshots are only built while someone is subscribed.

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::managers::link_manager::{LinkManager, LinkManagerTrait};
use crate::types::errors::LinkError;
use crate::types::link::BookmarkLink;
use crate::types::Scope;

/// Snapshot of one collection after a write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionChange {
    pub user_id: String,
    pub folder_id: Option<String>,
    /// Increases by one per published change to this collection.
    pub sequence: u64,
    pub links: Vec<BookmarkLink>,
}

/// Broadcast hub for [`CollectionChange`] events.
pub struct ChangeFeed {
    sender: broadcast::Sender<CollectionChange>,
    sequences: Mutex<HashMap<Scope, u64>>,
}

impl ChangeFeed {
    /// `capacity` bounds how far a slow subscriber may lag before it misses events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.sender.subscribe()
    }

    /// Publishes the current contents of `scope`'s collection.
    pub fn publish(&self, conn: &Connection, scope: &Scope) -> Result<(), LinkError> {
        let sequence = self.next_sequence(scope);
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        let links = LinkManager::new(conn).list_links(scope, None)?;
        debug!(user_id = %scope.user_id, folder_id = ?scope.folder_id, sequence, "publishing collection snapshot");
        // A send error only means every subscriber went away in the meantime.
        let _ = self.sender.send(CollectionChange {
            user_id: scope.user_id.clone(),
            folder_id: scope.folder_id.clone(),
            sequence,
            links,
        });
        Ok(())
    }

    /// Drops the sequence counter of a collection that no longer exists.
    pub fn forget(&self, scope: &Scope) {
        let mut sequences = self.sequences.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sequences.remove(scope);
    }

    fn next_sequence(&self, scope: &Scope) -> u64 {
        let mut sequences = self.sequences.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = sequences.entry(scope.clone()).or_insert(0);
        *counter += 1;
        *counter
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}
