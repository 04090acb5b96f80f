//! Unit tests for the request dispatcher: every method handled by
//! `handle_method`, using an in-memory database and a stub scraper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use linkvault::app::App;
use linkvault::database::Database;
use linkvault::rpc_handler::{handle_method, METHODS};
use linkvault::services::metadata_fetcher::{MetadataFetcher, PageScraper};
use linkvault::types::errors::FetchError;
use linkvault::types::link::OgMetadata;
use linkvault::types::settings::ServiceSettings;
use linkvault::types::Scope;

/// Scrapes only absolute http(s) URLs.
struct StubScraper;

#[async_trait]
impl PageScraper for StubScraper {
    async fn scrape(&self, url: &str) -> Result<OgMetadata, FetchError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        let mut meta = OgMetadata::new(url);
        meta.og_title = Some("Example".to_string());
        Ok(meta)
    }
}

fn setup() -> App {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let fetcher = MetadataFetcher::new(Arc::new(StubScraper), Duration::from_secs(2));
    App::with_fetcher(db, ServiceSettings::default(), fetcher)
}

async fn call(app: &App, method: &str, params: Value) -> Value {
    handle_method(app, method, &params)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

async fn call_err(app: &App, method: &str, params: Value) -> (u16, String) {
    let err = handle_method(app, method, &params)
        .await
        .expect_err("expected an error");
    (err.status_code(), err.to_string())
}

async fn create_folder(app: &App, name: &str) -> String {
    let folder = call(app, "createFolder", json!({"userId": "u1", "name": name})).await;
    folder["id"].as_str().unwrap().to_string()
}

// ─── Ping / unknown ───

#[tokio::test]
async fn test_ping() {
    let app = setup();
    assert_eq!(call(&app, "ping", json!({})).await, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let app = setup();
    let (status, msg) = call_err(&app, "nonexistent.method", json!({})).await;
    assert_eq!(status, 400);
    assert!(msg.contains("unknown method"));
}

#[tokio::test]
async fn test_every_listed_method_is_dispatched() {
    let app = setup();
    for method in METHODS {
        if let Err(err) = handle_method(&app, method, &json!({})).await {
            assert!(!err.to_string().contains("unknown method"), "{} not dispatched", method);
        }
    }
}

// ─── saveLinks ───

#[tokio::test]
async fn test_save_links_bulk_keeps_unscrapable_url() {
    let app = setup();
    let res = call(
        &app,
        "saveLinks",
        json!({"userId": "u1", "urls": ["https://a.com/", "not a real url"]}),
    )
    .await;

    assert_eq!(res["saved"], 2);
    assert_eq!(res["failed"], 0);
    let links = res["links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["requestUrl"], "https://a.com");
    assert_eq!(links[0]["ogTitle"], "Example");
    assert_eq!(links[1]["requestUrl"], "not a real url");
    assert_eq!(links[1]["ogTitle"], "");
    assert_eq!(links[1]["ogDescription"], "");
    assert_eq!(res["results"][1]["status"], "saved");
    assert_eq!(res["results"][1]["usedFallback"], true);

    let listed = call(&app, "listLinks", json!({"userId": "u1"})).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_save_links_bulk_drops_blank_lines() {
    let app = setup();
    let res = call(
        &app,
        "saveLinks",
        json!({"userId": "u1", "urls": ["", "   ", "https://a.com"]}),
    )
    .await;
    assert_eq!(res["saved"], 1);
}

#[tokio::test]
async fn test_save_links_empty_bulk_is_noop() {
    let app = setup();
    let res = call(&app, "saveLinks", json!({"userId": "u1", "urls": []})).await;
    assert_eq!(res["saved"], 0);
    assert_eq!(res["links"], json!([]));
}

#[tokio::test]
async fn test_save_single_link_with_tags() {
    let app = setup();
    let folder = create_folder(&app, "Work").await;
    let link = call(
        &app,
        "saveLinks",
        json!({"userId": "u1", "folderId": folder, "url": " https://a.com/ ", "tags": ["work", "work"]}),
    )
    .await;

    assert_eq!(link["requestUrl"], "https://a.com");
    assert_eq!(link["folderId"], folder.as_str());
    assert_eq!(link["tags"].as_array().unwrap().len(), 1);

    let tags = call(&app, "listTags", json!({"userId": "u1"})).await;
    assert_eq!(tags[0]["name"], "work");
    assert_eq!(tags[0]["links"][0], link["id"]);
}

#[tokio::test]
async fn test_save_links_validation() {
    let app = setup();
    let (status, msg) = call_err(&app, "saveLinks", json!({"userId": "u1"})).await;
    assert_eq!((status, msg.as_str()), (400, "missing url or urls"));

    let (status, _) = call_err(&app, "saveLinks", json!({"url": "https://a.com"})).await;
    assert_eq!(status, 400);

    let (status, _) = call_err(&app, "saveLinks", json!({"userId": "u1", "url": "  "})).await;
    assert_eq!(status, 400);

    let listed = call(&app, "listLinks", json!({"userId": "u1"})).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_save_links_unknown_folder_is_404() {
    let app = setup();
    let (status, _) = call_err(
        &app,
        "saveLinks",
        json!({"userId": "u1", "folderId": "nope", "urls": ["https://a.com"]}),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_save_links_all_failed_is_500() {
    let app = setup();
    app.db
        .connection()
        .execute_batch(
            "CREATE TRIGGER reject_all BEFORE INSERT ON links
             BEGIN SELECT RAISE(ABORT, 'read-only'); END;",
        )
        .unwrap();
    let (status, msg) = call_err(
        &app,
        "saveLinks",
        json!({"userId": "u1", "urls": ["https://a.com", "https://b.com"]}),
    )
    .await;
    assert_eq!(status, 500);
    assert!(msg.contains("read-only"));
}

// ─── updateLink ───

#[tokio::test]
async fn test_update_link_not_in_folder_is_404_and_writes_nothing() {
    let app = setup();
    let folder = create_folder(&app, "f1").await;
    let (status, _) = call_err(
        &app,
        "updateLink",
        json!({"userId": "u1", "folderId": folder, "linkId": "L1", "requestUrl": "https://a.com"}),
    )
    .await;

    assert_eq!(status, 404);
    let listed = call(&app, "listLinks", json!({"userId": "u1", "folderId": folder})).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_update_link_moves_with_null_target() {
    let app = setup();
    let folder = create_folder(&app, "f1").await;
    let link = call(
        &app,
        "saveLinks",
        json!({"userId": "u1", "folderId": folder, "url": "https://a.com"}),
    )
    .await;

    let updated = call(
        &app,
        "updateLink",
        json!({
            "userId": "u1",
            "folderId": folder,
            "linkId": link["id"],
            "requestUrl": "https://a.com/",
            "newFolderId": null
        }),
    )
    .await;

    assert_eq!(updated["linkId"], link["id"]);
    assert_eq!(updated["folderId"], Value::Null);
    let in_folder = call(&app, "listLinks", json!({"userId": "u1", "folderId": folder})).await;
    assert_eq!(in_folder, json!([]));
    let loose = call(&app, "listLinks", json!({"userId": "u1"})).await;
    assert_eq!(loose.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_link_absent_target_stays_put() {
    let app = setup();
    let folder = create_folder(&app, "f1").await;
    let link = call(
        &app,
        "saveLinks",
        json!({"userId": "u1", "folderId": folder, "url": "not a url"}),
    )
    .await;

    let updated = call(
        &app,
        "updateLink",
        json!({"userId": "u1", "folderId": folder, "linkId": link["id"], "requestUrl": "https://fixed.com"}),
    )
    .await;

    assert_eq!(updated["folderId"], folder.as_str());
    assert_eq!(updated["ogTitle"], "Example");
}

#[tokio::test]
async fn test_update_link_missing_fields_is_400() {
    let app = setup();
    for params in [
        json!({"linkId": "L1", "requestUrl": "https://a.com"}),
        json!({"userId": "u1", "requestUrl": "https://a.com"}),
        json!({"userId": "u1", "linkId": "L1"}),
    ] {
        let (status, _) = call_err(&app, "updateLink", params).await;
        assert_eq!(status, 400);
    }
}

// ─── fetchMetadata ───

#[tokio::test]
async fn test_fetch_metadata_success() {
    let app = setup();
    let meta = call(&app, "fetchMetadata", json!({"url": "https://a.com"})).await;
    assert_eq!(meta["requestUrl"], "https://a.com");
    assert_eq!(meta["ogTitle"], "Example");
}

#[tokio::test]
async fn test_fetch_metadata_failure_is_500() {
    let app = setup();
    let (status, msg) = call_err(&app, "fetchMetadata", json!({"url": "not a real url"})).await;
    assert_eq!(status, 500);
    assert!(msg.starts_with("Invalid URL"));

    let (status, _) = call_err(&app, "fetchMetadata", json!({})).await;
    assert_eq!(status, 400);
}

// ─── deleteLink ───

#[tokio::test]
async fn test_delete_link_by_id_and_url() {
    let app = setup();
    let a = call(&app, "saveLinks", json!({"userId": "u1", "url": "https://a.com"})).await;
    call(&app, "saveLinks", json!({"userId": "u1", "url": "https://b.com"})).await;

    let res = call(&app, "deleteLink", json!({"userId": "u1", "linkId": a["id"]})).await;
    assert_eq!(res["ok"], true);
    let res = call(&app, "deleteLink", json!({"userId": "u1", "requestUrl": "https://b.com/"})).await;
    assert_eq!(res["ok"], true);

    assert_eq!(call(&app, "listLinks", json!({"userId": "u1"})).await, json!([]));
    let (status, _) = call_err(&app, "deleteLink", json!({"userId": "u1", "linkId": a["id"]})).await;
    assert_eq!(status, 404);
    let (status, _) = call_err(&app, "deleteLink", json!({"userId": "u1"})).await;
    assert_eq!(status, 400);
}

// ─── Folders ───

#[tokio::test]
async fn test_folder_lifecycle() {
    let app = setup();
    let id = create_folder(&app, "Read Later").await;

    let renamed = call(
        &app,
        "renameFolder",
        json!({"userId": "u1", "folderId": id, "name": "Archive"}),
    )
    .await;
    assert_eq!(renamed["slug"], "archive");

    let folders = call(&app, "listFolders", json!({"userId": "u1"})).await;
    assert_eq!(folders.as_array().unwrap().len(), 1);

    call(&app, "saveLinks", json!({"userId": "u1", "folderId": id, "urls": ["https://a.com", "https://b.com"]})).await;
    let res = call(&app, "deleteFolder", json!({"userId": "u1", "folderId": id})).await;
    assert_eq!(res["deletedLinks"], 2);

    let (status, _) = call_err(&app, "deleteFolder", json!({"userId": "u1", "folderId": id})).await;
    assert_eq!(status, 404);
    let (status, _) = call_err(&app, "createFolder", json!({"userId": "u1", "name": " "})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_delete_folder_publishes_empty_snapshot_and_resets_sequence() {
    let app = setup();
    let id = create_folder(&app, "Inbox").await;
    let mut rx = app.feed.subscribe();

    call(&app, "saveLinks", json!({"userId": "u1", "folderId": id, "urls": ["https://a.com"]})).await;
    call(&app, "deleteFolder", json!({"userId": "u1", "folderId": id})).await;

    let mut last = None;
    while let Ok(change) = rx.try_recv() {
        last = Some(change);
    }
    let last = last.expect("deleteFolder should publish a snapshot");
    assert_eq!(last.folder_id.as_deref(), Some(id.as_str()));
    assert_eq!(last.sequence, 2);
    assert!(last.links.is_empty());

    let scope = Scope::new("u1", Some(id.clone()));
    app.feed.publish(&app.db.connection(), &scope).unwrap();
    assert_eq!(rx.try_recv().unwrap().sequence, 1);
}
