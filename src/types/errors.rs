use std::time::Duration;

use thiserror::Error;

// === FetchError ===

/// Errors raised while scraping a page for Open Graph metadata.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The input is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The request could not be sent or the body could not be read.
    #[error("Fetch network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("Fetch returned HTTP {0}")]
    HttpStatus(u16),
    /// The fetch did not finish within the configured limit.
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

// === LinkError ===

/// Errors related to link persistence operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Link with the given ID was not found in the addressed collection.
    #[error("Link not found: {0}")]
    NotFound(String),
    /// The target folder was not found for this user.
    #[error("Folder not found: {0}")]
    FolderNotFound(String),
    /// No user id was supplied for a write.
    #[error("Missing user id")]
    MissingUser,
    /// Database operation failed.
    #[error("Link database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for LinkError {
    fn from(err: rusqlite::Error) -> Self {
        LinkError::DatabaseError(err.to_string())
    }
}

// === FolderError ===

/// Errors related to folder management operations.
#[derive(Debug, Error)]
pub enum FolderError {
    /// Folder with the given ID was not found.
    #[error("Folder not found: {0}")]
    NotFound(String),
    /// The folder name is empty after trimming.
    #[error("Invalid folder name: {0:?}")]
    InvalidName(String),
    /// No user id was supplied.
    #[error("Missing user id")]
    MissingUser,
    /// Database operation failed.
    #[error("Folder database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for FolderError {
    fn from(err: rusqlite::Error) -> Self {
        FolderError::DatabaseError(err.to_string())
    }
}

impl From<LinkError> for FolderError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::MissingUser => FolderError::MissingUser,
            LinkError::FolderNotFound(id) => FolderError::NotFound(id),
            other => FolderError::DatabaseError(other.to_string()),
        }
    }
}

// === TagError ===

/// Errors related to tag reconciliation.
#[derive(Debug, Error)]
pub enum TagError {
    /// Random colour selection failed.
    #[error("Tag colour selection failed")]
    Random,
    /// Database operation failed.
    #[error("Tag database error: {0}")]
    DatabaseError(String),
}

impl From<rusqlite::Error> for TagError {
    fn from(err: rusqlite::Error) -> Self {
        TagError::DatabaseError(err.to_string())
    }
}

// === IngestError ===

/// Errors from a save or update that got past validation.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Tag(#[from] TagError),
}

// === SettingsError ===

/// Errors related to loading and saving service settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// A setting holds a value the service cannot use.
    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

// === ApiError ===

/// Errors surfaced at the request boundary, each mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required input was missing or malformed. Nothing was persisted.
    #[error("{0}")]
    BadRequest(String),
    /// The addressed link or folder does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Persistence, scraping, or another internal failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::NotFound(_) | LinkError::FolderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            LinkError::MissingUser => ApiError::BadRequest(err.to_string()),
            LinkError::DatabaseError(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<FolderError> for ApiError {
    fn from(err: FolderError) -> Self {
        match err {
            FolderError::NotFound(_) => ApiError::NotFound(err.to_string()),
            FolderError::InvalidName(_) | FolderError::MissingUser => {
                ApiError::BadRequest(err.to_string())
            }
            FolderError::DatabaseError(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<TagError> for ApiError {
    fn from(err: TagError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Link(e) => e.into(),
            IngestError::Tag(e) => e.into(),
        }
    }
}
