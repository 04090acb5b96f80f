//! Request and response bodies for the ingestion endpoints.

use serde::{Deserialize, Deserializer, Serialize};

use super::link::BookmarkLink;

/// Body of `saveLinks`. Exactly one of `url` (single mode) or `urls`
/// (bulk mode) is expected; `url` wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLinksRequest {
    pub url: Option<String>,
    pub urls: Option<Vec<String>>,
    pub user_id: Option<String>,
    pub folder_id: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Body of `updateLink`.
///
/// `newFolderId` distinguishes "absent" (stay in `folderId`) from an explicit
/// `null` (move to uncategorized).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    pub user_id: Option<String>,
    pub folder_id: Option<String>,
    pub link_id: Option<String>,
    pub request_url: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub new_folder_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Result of one URL within a bulk save.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LinkOutcome {
    #[serde(rename_all = "camelCase")]
    Saved {
        request_url: String,
        link: BookmarkLink,
        used_fallback: bool,
    },
    #[serde(rename_all = "camelCase")]
    Failed { request_url: String, error: String },
}

impl LinkOutcome {
    pub fn request_url(&self) -> &str {
        match self {
            LinkOutcome::Saved { request_url, .. } | LinkOutcome::Failed { request_url, .. } => {
                request_url
            }
        }
    }

    pub fn link(&self) -> Option<&BookmarkLink> {
        match self {
            LinkOutcome::Saved { link, .. } => Some(link),
            LinkOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregate result of a bulk save. `results` follows input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub links: Vec<BookmarkLink>,
    pub results: Vec<LinkOutcome>,
    pub saved: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_outcomes(results: Vec<LinkOutcome>) -> Self {
        let links: Vec<BookmarkLink> = results.iter().filter_map(|o| o.link().cloned()).collect();
        let saved = links.len();
        let failed = results.len() - saved;
        Self {
            links,
            results,
            saved,
            failed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when there was work to do and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.saved == 0
    }
}
