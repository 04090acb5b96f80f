//! HTTP surface for linkvault.
//!
//! Every dispatch method is served as `POST /<method>` with a JSON body.
//! Errors are returned as `{"error": "<message>"}` with the status taken
//! from `ApiError::status_code`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::app::App;
use crate::rpc_handler::{handle_method, METHODS};
use crate::types::errors::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// An empty body is treated as `{}` so missing fields surface as 400s.
fn parse_request(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))
}

fn rpc_route(method: &'static str) -> MethodRouter<Arc<App>> {
    post(move |State(app): State<Arc<App>>, body: Bytes| async move {
        let params = parse_request(&body)?;
        handle_method(&app, method, &params).await.map(Json)
    })
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Builds the service router.
pub fn router(app: Arc<App>) -> Router {
    let mut router = Router::new().route("/health", get(health));
    for &method in METHODS {
        router = router.route(&format!("/{}", method), rpc_route(method));
    }
    router.with_state(app)
}
