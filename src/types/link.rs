use serde::{Deserialize, Serialize};

/// One Open Graph image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OgImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl OgImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }
}

/// Metadata scraped from a page. Every field is explicitly present or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgMetadata {
    pub request_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(default)]
    pub og_image: Vec<OgImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl OgMetadata {
    pub fn new(request_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            ..Self::default()
        }
    }
}

/// What the save/update flow got back from the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page was scraped successfully.
    Scraped(OgMetadata),
    /// Scraping failed; the link is still saved with blank metadata.
    Fallback { request_url: String, reason: String },
}

impl FetchOutcome {
    pub fn request_url(&self) -> &str {
        match self {
            FetchOutcome::Scraped(meta) => &meta.request_url,
            FetchOutcome::Fallback { request_url, .. } => request_url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FetchOutcome::Fallback { .. })
    }

    /// Flattens the outcome into the columns the persister writes.
    pub fn into_fields(self) -> LinkFields {
        match self {
            FetchOutcome::Scraped(meta) => LinkFields {
                request_url: meta.request_url,
                og_title: meta.og_title.unwrap_or_default(),
                og_description: meta.og_description.unwrap_or_default(),
                og_url: meta.og_url,
                og_image: meta.og_image,
                favicon: meta.favicon,
            },
            FetchOutcome::Fallback { request_url, .. } => LinkFields::blank(request_url),
        }
    }
}

/// Column values for a link write, independent of id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFields {
    pub request_url: String,
    pub og_title: String,
    pub og_description: String,
    pub og_url: Option<String>,
    pub og_image: Vec<OgImage>,
    pub favicon: Option<String>,
}

impl LinkFields {
    /// The fallback record: the URL with every metadata field blank.
    pub fn blank(request_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            og_title: String::new(),
            og_description: String::new(),
            og_url: None,
            og_image: Vec::new(),
            favicon: None,
        }
    }
}

/// A saved link as stored and returned over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkLink {
    pub id: String,
    pub request_url: String,
    pub og_title: String,
    pub og_description: String,
    pub og_url: Option<String>,
    pub og_image: Vec<OgImage>,
    pub favicon: Option<String>,
    pub folder_id: Option<String>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
