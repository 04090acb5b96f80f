// linkvault shared type definitions
// Each submodule defines types used across the service.

pub mod errors;
pub mod folder;
pub mod ingest;
pub mod link;
pub mod settings;
pub mod tag;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current UNIX timestamp in milliseconds.
///
/// All persisted `createdAt`/`updatedAt` values use this clock.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// The user/folder a request operates on.
///
/// Built per request by the dispatcher and passed down explicitly;
/// `folder_id == None` addresses the user's uncategorized collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub user_id: String,
    pub folder_id: Option<String>,
}

impl Scope {
    pub fn new(user_id: impl Into<String>, folder_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            folder_id,
        }
    }

    pub fn uncategorized(user_id: impl Into<String>) -> Self {
        Self::new(user_id, None)
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }
}
