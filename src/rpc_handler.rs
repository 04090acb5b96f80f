//! Request dispatch for linkvault.
//!
//! `handle_method` maps a method name and a JSON body to a JSON result. The
//! HTTP layer exposes each method as `POST /<method>`; keeping the dispatch
//! here lets it be tested without a server.
//!
//! Input validation happens before any fetch or write: a request rejected
//! with `ApiError::BadRequest` has had no side effects.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::managers::folder_manager::{FolderManager, FolderManagerTrait};
use crate::managers::link_manager::{LinkManager, LinkManagerTrait};
use crate::managers::tag_manager::{TagManager, TagManagerTrait};
use crate::services::ingestion::LinkUpdate;
use crate::services::url_normalizer::normalize_url;
use crate::types::errors::ApiError;
use crate::types::ingest::{LinkOutcome, SaveLinksRequest, UpdateLinkRequest};
use crate::types::Scope;

/// Every method `handle_method` understands.
pub const METHODS: &[&str] = &[
    "ping",
    "saveLinks",
    "updateLink",
    "fetchMetadata",
    "deleteLink",
    "listLinks",
    "createFolder",
    "renameFolder",
    "listFolders",
    "deleteFolder",
    "listTags",
];

fn bad(msg: &str) -> ApiError {
    ApiError::BadRequest(msg.to_string())
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn parse_body<T: DeserializeOwned>(params: &Value) -> Result<T, ApiError> {
    serde_json::from_value(params.clone()).map_err(|e| ApiError::BadRequest(format!("invalid body: {}", e)))
}

/// A string parameter that is present and not blank.
fn required<'a>(params: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {}", key)))
}

/// A string parameter that may be absent, null, or blank (all meaning `None`).
fn optional(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn scope_of(params: &Value) -> Result<Scope, ApiError> {
    let user_id = required(params, "userId")?;
    Ok(Scope::new(user_id, optional(params, "folderId")))
}

/// Dispatch a method call to the appropriate handler.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, ApiError> {
    debug!(method, "dispatching request");
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Ingestion ───
        "saveLinks" => {
            let req: SaveLinksRequest = parse_body(params)?;
            if req.url.is_none() && req.urls.is_none() {
                return Err(bad("missing url or urls"));
            }
            let user_id = non_blank(req.user_id).ok_or_else(|| bad("missing userId"))?;
            let scope = Scope::new(user_id, non_blank(req.folder_id));

            if let Some(raw) = req.url.as_deref() {
                let url = normalize_url(raw).ok_or_else(|| bad("missing url"))?;
                let tags = req.tags.unwrap_or_default();
                let link = app.ingestion.ingest_one(&scope, &url, &tags).await?;
                return to_json(link);
            }

            let urls: Vec<String> = req
                .urls
                .unwrap_or_default()
                .iter()
                .filter_map(|u| normalize_url(u))
                .collect();
            let report = app.ingestion.ingest_batch(&scope, &urls).await?;
            if report.all_failed() {
                let first = report
                    .results
                    .iter()
                    .find_map(|r| match r {
                        LinkOutcome::Failed { error, .. } => Some(error.as_str()),
                        _ => None,
                    })
                    .unwrap_or("unknown error");
                return Err(ApiError::Internal(format!(
                    "failed to save all {} links: {}",
                    report.failed, first
                )));
            }
            to_json(report)
        }
        "updateLink" => {
            let req: UpdateLinkRequest = parse_body(params)?;
            let user_id = non_blank(req.user_id).ok_or_else(|| bad("missing userId"))?;
            let link_id = non_blank(req.link_id).ok_or_else(|| bad("missing linkId"))?;
            let request_url = req
                .request_url
                .as_deref()
                .and_then(normalize_url)
                .ok_or_else(|| bad("missing requestUrl"))?;
            let scope = Scope::new(user_id, non_blank(req.folder_id));
            let update = LinkUpdate {
                link_id,
                request_url,
                target_folder: req.new_folder_id.map(non_blank),
                tags: req.tags,
            };

            let link = app.ingestion.update_link(&scope, update).await?;
            let mut value = to_json(&link)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("linkId".to_string(), json!(link.id));
            }
            Ok(value)
        }
        "fetchMetadata" => {
            let url = required(params, "url")?;
            let meta = app.ingestion.fetcher().scrape(url).await?;
            to_json(meta)
        }

        // ─── Links ───
        "deleteLink" => {
            let scope = scope_of(params)?;
            let link_id = optional(params, "linkId");
            let request_url = optional(params, "requestUrl");
            if link_id.is_none() && request_url.is_none() {
                return Err(bad("missing linkId or requestUrl"));
            }
            let id = app
                .ingestion
                .delete_link(&scope, link_id.as_deref(), request_url.as_deref())?;
            Ok(json!({"ok": true, "linkId": id}))
        }
        "listLinks" => {
            let scope = scope_of(params)?;
            let query = optional(params, "query");
            let conn = app.db.connection();
            let links = LinkManager::new(&conn).list_links(&scope, query.as_deref())?;
            to_json(links)
        }

        // ─── Folders ───
        "createFolder" => {
            let user_id = required(params, "userId")?;
            let name = required(params, "name")?;
            let conn = app.db.connection();
            let folder = FolderManager::new(&conn).create_folder(user_id, name)?;
            to_json(folder)
        }
        "renameFolder" => {
            let user_id = required(params, "userId")?;
            let folder_id = required(params, "folderId")?;
            let name = required(params, "name")?;
            let conn = app.db.connection();
            let folder = FolderManager::new(&conn).rename_folder(user_id, folder_id, name)?;
            to_json(folder)
        }
        "listFolders" => {
            let user_id = required(params, "userId")?;
            let conn = app.db.connection();
            let folders = FolderManager::new(&conn).list_folders(user_id)?;
            to_json(folders)
        }
        "deleteFolder" => {
            let user_id = required(params, "userId")?;
            let folder_id = required(params, "folderId")?;
            let conn = app.db.connection();
            let removed = FolderManager::new(&conn).delete_folder(user_id, folder_id)?;
            let scope = Scope::new(user_id, Some(folder_id.to_string()));
            app.ingestion.notify(&conn, &scope);
            app.feed.forget(&scope);
            Ok(json!({"ok": true, "deletedLinks": removed}))
        }

        // ─── Tags ───
        "listTags" => {
            let user_id = required(params, "userId")?;
            let conn = app.db.connection();
            let tags = TagManager::new(&conn).list_tags(user_id)?;
            to_json(tags)
        }

        _ => Err(ApiError::BadRequest(format!("unknown method: {}", method))),
    }
}
