//! REST surface - outer layer
//!
//! Thin HTTP wrapper over the services: every JSON reply is wrapped in
//! `{success, data}` or `{success: false, message, code}`. Binary replies
//! (captcha image, PDF, ZIP) are sent as is.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::Rng;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

use crate::error::AppError;
use handlers::*;
pub use state::{AppState, SessionSlot, SessionStore};

/// Header carrying the caller's session id
pub const SESSION_HEADER: &str = "x-session-id";
/// Cookie carrying the session id minted for anonymous callers
pub const SESSION_COOKIE: &str = "ecourts_sid";
const MAX_SESSION_ID_LEN: usize = 128;

pub type ApiResult = Result<Response, AppError>;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/states", get(handle_states))
        .route("/api/districts", get(handle_districts))
        .route("/api/complexes", get(handle_complexes))
        .route("/api/courts", get(handle_courts))
        .route("/api/captcha", get(handle_captcha))
        .route("/api/causelist", post(handle_cause_list))
        .route("/api/causelist/today", post(handle_cause_list_today))
        .route("/api/causelist/tomorrow", post(handle_cause_list_tomorrow))
        .route("/api/causelist/pdf", post(handle_cause_list_pdf))
        .route("/api/causelist/pdf/all", post(handle_cause_list_pdf_all))
        .route("/api/stats", post(handle_stats))
        .route("/api/search/cnr", post(handle_search_cnr))
        .route("/api/search/case", post(handle_search_case))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

/// `{success: true, data}`
pub(crate) fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "data": data })),
    )
        .into_response()
}

pub(crate) fn error_envelope(status: StatusCode, message: &str, code: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "message": message, "code": code })),
    )
        .into_response()
}

/// HTTP status for each error kind
pub fn status_of(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidCaptcha { .. } | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AppError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::UpstreamShapeChanged { .. } | AppError::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
        AppError::CaseNotFound { .. } => StatusCode::NOT_FOUND,
        AppError::RenderingUnavailable { .. }
        | AppError::Config(_)
        | AppError::Io(_)
        | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("⚠️ {}", self);
        }
        error_envelope(status, &self.to_string(), self.code())
    }
}

/// Session id of a request: header, then the body/query field, then the cookie
///
/// `None` for anonymous callers; there is no shared fallback session.
pub(crate) fn session_id(headers: &HeaderMap, field: Option<&str>) -> Option<String> {
    let header = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
    [header, field, session_cookie(headers)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(|id| id.chars().take(MAX_SESSION_ID_LEN).collect())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Fresh unguessable session id (128 random bits, hex)
pub(crate) fn new_session_id() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

/// Hand a session id back in `X-Session-Id` and as a cookie
pub(crate) fn attach_session(response: &mut Response, id: &str) {
    let h = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(id) {
        h.insert(SESSION_HEADER, value);
    }
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        h.insert(header::SET_COOKIE, value);
    }
}
