//! Route handlers

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::state::{AppState, SessionSlot};
use super::{attach_session, new_session_id, ok, session_id, ApiResult};
use crate::error::{AppError, AppResult};
use crate::models::{CaptchaModule, CaseKind, CaseNumberQuery, CauseListQuery, WireDate};
use crate::services::{cause_list_stats, CaptchaSession, FetchedCauseList, JurisdictionResolver};
use crate::workflow::AllCourtsRequest;

#[derive(Debug, Deserialize)]
pub struct JurisdictionParams {
    #[serde(default)]
    state_code: String,
    #[serde(default)]
    dist_code: String,
    #[serde(default, alias = "court_complex_code")]
    complex_code: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptchaParams {
    #[serde(default)]
    module: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Body of the cause-list family of endpoints
#[derive(Debug, Deserialize)]
pub struct CauseListRequest {
    state_code: String,
    dist_code: String,
    #[serde(alias = "complex_code")]
    court_complex_code: String,
    #[serde(default)]
    court_code: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    case_type: Option<String>,
    #[serde(default, alias = "captcha")]
    captcha_code: String,
    #[serde(default)]
    court_name_txt: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

impl CauseListRequest {
    fn date(&self, forced: Option<WireDate>) -> AppResult<WireDate> {
        match (forced, self.date.as_deref().map(str::trim)) {
            (Some(date), _) => Ok(date),
            (None, Some(raw)) if !raw.is_empty() => WireDate::parse(raw),
            _ => Ok(WireDate::today()),
        }
    }

    fn case_kind(&self) -> AppResult<CaseKind> {
        self.case_type.as_deref().unwrap_or_default().parse()
    }

    fn require_captcha(&self) -> AppResult<()> {
        if self.captcha_code.trim().is_empty() {
            return Err(AppError::invalid_request("captcha_code is required"));
        }
        Ok(())
    }

    /// Date and case kind of a well-formed request
    fn validate(&self, forced: Option<WireDate>) -> AppResult<(WireDate, CaseKind)> {
        let date = self.date(forced)?;
        let case_kind = self.case_kind()?;
        self.require_captcha()?;
        Ok((date, case_kind))
    }
}

#[derive(Debug, Deserialize)]
pub struct CnrRequest {
    #[serde(default)]
    cnr: String,
    #[serde(default, alias = "captcha")]
    captcha_code: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaseSearchRequest {
    #[serde(flatten)]
    query: CaseNumberQuery,
    #[serde(default, alias = "captcha")]
    captcha_code: String,
    #[serde(default)]
    session_id: Option<String>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(v)| v)
        .map_err(|rejection| AppError::invalid_request(rejection.body_text()))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    params
        .map(|Query(v)| v)
        .map_err(|rejection| AppError::invalid_request(rejection.body_text()))
}

/// Session id of the caller; anonymous callers get a fresh one
///
/// The flag is set when the id was minted here and must be handed back.
fn caller_session(headers: &HeaderMap, field: Option<&str>) -> (String, bool) {
    match session_id(headers, field) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    }
}

fn remember(mut response: Response, id: &str, minted: bool) -> Response {
    if minted {
        attach_session(&mut response, id);
    }
    response
}

/// Session id of a captcha-bound request
///
/// An anonymous caller cannot have a captcha pending.
fn require_session(headers: &HeaderMap, field: Option<&str>) -> AppResult<String> {
    session_id(headers, field).ok_or_else(|| {
        AppError::invalid_captcha("no session id on the request; fetch /api/captcha first")
    })
}

/// The captcha last shown to this caller for `module`
fn take_captcha(slot: &mut SessionSlot, module: CaptchaModule) -> AppResult<CaptchaSession> {
    slot.pending.remove(&module).ok_or_else(|| {
        AppError::invalid_captcha(format!(
            "no {} captcha pending for this session; fetch /api/captcha first",
            module
        ))
    })
}

/// GET /api/health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Local::now().to_rfc3339(),
    });
    (StatusCode::OK, Json(response))
}

/// GET /api/states
pub(crate) async fn handle_states(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<JurisdictionParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let (id, minted) = caller_session(&headers, params.session_id.as_deref());
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let states = JurisdictionResolver::new(&mut slot.manager).list_states().await?;
    Ok(remember(ok(states), &id, minted))
}

/// GET /api/districts?state_code=
pub(crate) async fn handle_districts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<JurisdictionParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let (id, minted) = caller_session(&headers, params.session_id.as_deref());
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let districts = JurisdictionResolver::new(&mut slot.manager)
        .list_districts(&params.state_code)
        .await?;
    Ok(remember(ok(districts), &id, minted))
}

/// GET /api/complexes?state_code=&dist_code=
pub(crate) async fn handle_complexes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<JurisdictionParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let (id, minted) = caller_session(&headers, params.session_id.as_deref());
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let complexes = JurisdictionResolver::new(&mut slot.manager)
        .list_complexes(&params.state_code, &params.dist_code)
        .await?;
    Ok(remember(ok(complexes), &id, minted))
}

/// GET /api/courts?state_code=&dist_code=&complex_code=
pub(crate) async fn handle_courts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<JurisdictionParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let (id, minted) = caller_session(&headers, params.session_id.as_deref());
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let courts = JurisdictionResolver::new(&mut slot.manager)
        .list_courts(&params.state_code, &params.dist_code, &params.complex_code)
        .await?;
    Ok(remember(ok(courts), &id, minted))
}

/// GET /api/captcha?module=
///
/// Binary image. The session id (minted for anonymous callers) comes back
/// in `X-Session-Id` and the `ecourts_sid` cookie.
pub(crate) async fn handle_captcha(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<CaptchaParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let module: CaptchaModule = params.module.parse()?;
    let (id, _) = caller_session(&headers, params.session_id.as_deref());

    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    slot.pending.remove(&module);
    let captcha = slot.manager.issue(module).await?;
    let image = captcha.image.clone();
    let content_type = captcha.content_type.clone();
    slot.pending.insert(module, captcha);

    let mut response = Response::new(Body::from(image));
    let h = response.headers_mut();
    h.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type).unwrap_or(HeaderValue::from_static("image/png")),
    );
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    attach_session(&mut response, &id);
    Ok(response)
}

/// Resolve the court, take the pending captcha and fetch
async fn fetch_for_request(
    state: &AppState,
    slot: &mut SessionSlot,
    request: &CauseListRequest,
    (date, case_kind): (WireDate, CaseKind),
) -> AppResult<(FetchedCauseList, CauseListQuery)> {
    let (court_code, resolved_name) = JurisdictionResolver::new(&mut slot.manager)
        .resolve_court(
            &request.state_code,
            &request.dist_code,
            &request.court_complex_code,
            &request.court_code,
        )
        .await?;

    let captcha = take_captcha(slot, CaptchaModule::CauseList)?;
    let query = CauseListQuery::new(
        request.state_code.clone(),
        request.dist_code.clone(),
        request.court_complex_code.clone(),
        court_code,
        date,
        case_kind,
        request.captcha_code.clone(),
        request.court_name_txt.clone().or(resolved_name),
    );
    let fetched = state.fetcher.fetch(&mut slot.manager, &captcha, &query).await?;
    Ok((fetched, query))
}

async fn cause_list_response(
    state: Arc<AppState>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
    forced_date: Option<WireDate>,
) -> ApiResult {
    let request = json_body(body)?;
    let checked = request.validate(forced_date)?;
    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let (fetched, _) = fetch_for_request(&state, &mut slot, &request, checked).await?;
    Ok(ok(fetched.cause_list))
}

/// POST /api/causelist
pub(crate) async fn handle_cause_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    cause_list_response(state, headers, body, None).await
}

/// POST /api/causelist/today
pub(crate) async fn handle_cause_list_today(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    cause_list_response(state, headers, body, Some(WireDate::today())).await
}

/// POST /api/causelist/tomorrow
pub(crate) async fn handle_cause_list_tomorrow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    cause_list_response(state, headers, body, Some(WireDate::tomorrow())).await
}

/// POST /api/causelist/pdf
pub(crate) async fn handle_cause_list_pdf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(body)?;
    let checked = request.validate(None)?;
    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let (fetched, query) = fetch_for_request(&state, &mut slot, &request, checked).await?;
    drop(slot);

    let court_name = query
        .court_name()
        .map(str::to_string)
        .unwrap_or_else(|| query.court_code().to_string());
    let pdf = state.renderer.render_single(&fetched.cause_list, &court_name).await?;
    let file_name = format!(
        "causelist_{}_{}.pdf",
        query.court_code().as_str().replace('^', "-"),
        query.date()
    );
    Ok(binary("application/pdf", &file_name, pdf))
}

/// POST /api/causelist/pdf/all
pub(crate) async fn handle_cause_list_pdf_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(body)?;
    let all = AllCourtsRequest {
        state_code: request.state_code.clone(),
        dist_code: request.dist_code.clone(),
        complex_code: request.court_complex_code.clone(),
        date: request.date(None)?,
        case_kind: request.case_kind()?,
        captcha_answer: request.captcha_code.trim().to_string(),
    };
    request.require_captcha()?;

    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let captcha = take_captcha(&mut slot, CaptchaModule::CauseList)?;
    let archive = state.all_courts.run(&mut slot.manager, &captcha, &all).await?;

    info!("✓ all-courts archive for complex {} ({} bytes)", all.complex_code, archive.len());
    let file_name = format!("causelists_{}_{}.zip", all.complex_code, all.date);
    Ok(binary("application/zip", &file_name, archive))
}

/// POST /api/stats
pub(crate) async fn handle_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CauseListRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(body)?;
    let checked = request.validate(None)?;
    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let (fetched, query) = fetch_for_request(&state, &mut slot, &request, checked).await?;
    Ok(ok(cause_list_stats(&fetched.cause_list, query.court_code().as_str())))
}

/// POST /api/search/cnr
pub(crate) async fn handle_search_cnr(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CnrRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(body)?;
    if request.cnr.trim().is_empty() {
        return Err(AppError::invalid_request("cnr is required"));
    }
    if request.captcha_code.trim().is_empty() {
        return Err(AppError::invalid_request("captcha_code is required"));
    }

    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let captcha = take_captcha(&mut slot, CaptchaModule::CaseStatus)?;
    let record = state
        .cnr
        .lookup(&mut slot.manager, &captcha, &request.cnr, &request.captcha_code)
        .await?;
    Ok(ok(record))
}

/// POST /api/search/case
pub(crate) async fn handle_search_case(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CaseSearchRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(body)?;
    if request.captcha_code.trim().is_empty() {
        return Err(AppError::invalid_request("captcha_code is required"));
    }

    let id = require_session(&headers, request.session_id.as_deref())?;
    let slot = state.sessions.slot(&id).await;
    let mut slot = slot.lock().await;
    let captcha = take_captcha(&mut slot, CaptchaModule::CaseStatus)?;
    let record = state
        .cnr
        .search_case_number(&mut slot.manager, &captcha, &request.query, &request.captcha_code)
        .await?;
    Ok(ok(record))
}

/// Fallback for unmatched routes
pub(crate) async fn handle_not_found() -> Response {
    super::error_envelope(StatusCode::NOT_FOUND, "not found", "NOT_FOUND")
}

fn binary(content_type: &'static str, file_name: &str, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    let h = response.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        h.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
