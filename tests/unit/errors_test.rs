use std::time::Duration;

use linkvault::types::errors::*;

// === FetchError Tests ===

#[test]
fn fetch_error_invalid_url_display() {
    let err = FetchError::InvalidUrl("not a real url".to_string());
    assert_eq!(err.to_string(), "Invalid URL: not a real url");
}

#[test]
fn fetch_error_http_status_display() {
    let err = FetchError::HttpStatus(503);
    assert_eq!(err.to_string(), "Fetch returned HTTP 503");
}

#[test]
fn fetch_error_timeout_display() {
    let err = FetchError::Timeout(Duration::from_secs(10));
    assert_eq!(err.to_string(), "Fetch timed out after 10s");
}

#[test]
fn fetch_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(FetchError::Network("reset".to_string()));
    assert!(err.source().is_none());
}

// === LinkError Tests ===

#[test]
fn link_error_not_found_display() {
    let err = LinkError::NotFound("L1".to_string());
    assert_eq!(err.to_string(), "Link not found: L1");
}

#[test]
fn link_error_folder_not_found_display() {
    let err = LinkError::FolderNotFound("f1".to_string());
    assert_eq!(err.to_string(), "Folder not found: f1");
}

#[test]
fn link_error_from_rusqlite() {
    let err: LinkError = rusqlite_error().into();
    assert!(matches!(err, LinkError::DatabaseError(_)));
}

// === FolderError Tests ===

#[test]
fn folder_error_invalid_name_display() {
    let err = FolderError::InvalidName("  ".to_string());
    assert_eq!(err.to_string(), "Invalid folder name: \"  \"");
}

#[test]
fn folder_error_from_link_error() {
    assert!(matches!(FolderError::from(LinkError::MissingUser), FolderError::MissingUser));
    assert!(matches!(
        FolderError::from(LinkError::FolderNotFound("f".into())),
        FolderError::NotFound(id) if id == "f"
    ));
}

// === IngestError Tests ===

#[test]
fn ingest_error_is_transparent() {
    let err = IngestError::from(LinkError::NotFound("L1".to_string()));
    assert_eq!(err.to_string(), "Link not found: L1");
}

// === ApiError Tests ===

#[test]
fn api_error_display_is_bare_message() {
    assert_eq!(ApiError::BadRequest("missing userId".into()).to_string(), "missing userId");
}

#[test]
fn api_error_status_codes() {
    assert_eq!(ApiError::BadRequest(String::new()).status_code(), 400);
    assert_eq!(ApiError::NotFound(String::new()).status_code(), 404);
    assert_eq!(ApiError::Internal(String::new()).status_code(), 500);
}

#[test]
fn api_error_from_link_error() {
    assert_eq!(ApiError::from(LinkError::NotFound("L1".into())).status_code(), 404);
    assert_eq!(ApiError::from(LinkError::FolderNotFound("f1".into())).status_code(), 404);
    assert_eq!(ApiError::from(LinkError::MissingUser).status_code(), 400);
    assert_eq!(ApiError::from(LinkError::DatabaseError("locked".into())).status_code(), 500);
}

#[test]
fn api_error_from_folder_error() {
    assert_eq!(ApiError::from(FolderError::NotFound("f1".into())).status_code(), 404);
    assert_eq!(ApiError::from(FolderError::InvalidName("".into())).status_code(), 400);
    assert_eq!(ApiError::from(FolderError::DatabaseError("x".into())).status_code(), 500);
}

#[test]
fn api_error_from_fetch_error_is_internal() {
    let err = ApiError::from(FetchError::InvalidUrl("ftp://x".into()));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.to_string(), "Invalid URL: ftp://x");
}

#[test]
fn api_error_from_ingest_error_keeps_mapping() {
    let err = ApiError::from(IngestError::Link(LinkError::NotFound("L1".into())));
    assert_eq!(err.status_code(), 404);
    let err = ApiError::from(IngestError::Tag(TagError::Random));
    assert_eq!(err.status_code(), 500);
}

// === SettingsError Tests ===

#[test]
fn settings_error_invalid_value_display() {
    let err = SettingsError::InvalidValue("fetcher.timeoutSecs must be at least 1".to_string());
    assert_eq!(
        err.to_string(),
        "Invalid setting value: fetcher.timeoutSecs must be at least 1"
    );
}

fn rusqlite_error() -> rusqlite::Error {
    rusqlite::Error::QueryReturnedNoRows
}
