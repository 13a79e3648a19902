//! In-process stand-in for the court portal
//!
//! Speaks just enough of the portal's protocol for the service layer: a
//! cookie per client, a rotating `app_token`, option lists, a captcha image
//! and the submit endpoints. The valid captcha answer is [`CAPTCHA_ANSWER`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use ecourts_scraper::Config;
use serde_json::json;

pub const CAPTCHA_ANSWER: &str = "abc12";
pub const KNOWN_CNR: &str = "KLER010001232024";
/// Complex whose two establishments both run a court number 7
pub const SHARED_NUMBER_COMPLEX: &str = "1040009";
/// Court answered with an `errormsg` no-record reply instead of `case_data`
pub const ERRORMSG_EMPTY_COURT: &str = "2^9";
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-captcha";

/// Counters and switches shared with the test body
#[derive(Default)]
pub struct FakeState {
    tokens: Mutex<HashMap<String, String>>,
    counter: AtomicU64,
    /// Next POST is answered as if the token had gone stale
    pub expire_next: AtomicBool,
    pub cookies_issued: AtomicUsize,
    pub captchas_served: AtomicUsize,
    pub submits: AtomicUsize,
}

impl FakeState {
    fn next_token(&self) -> String {
        format!("{:016x}", 0xfeed_0000 + self.counter.fetch_add(1, Ordering::SeqCst))
    }

    fn rotate(&self, sid: &str) -> String {
        let token = self.next_token();
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(sid.to_string(), token.clone());
        }
        token
    }

    fn token_of(&self, sid: &str) -> Option<String> {
        self.tokens.lock().ok()?.get(sid).cloned()
    }
}

pub struct FakeUpstream {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/", get(on_get).post(on_post))
            .route("/securimage/securimage_show.php", get(on_securimage))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self, output_dir: &Path) -> Config {
        Config {
            upstream_base_url: self.base_url.clone(),
            request_timeout_secs: 5,
            output_dir: output_dir.to_string_lossy().into_owned(),
            render_timeout_secs: 2,
            ..Config::default()
        }
    }
}

fn session_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("PHPSESSID="))
        .map(String::from)
        .next()
}

async fn on_get(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let page = query.get("p").map(String::as_str).unwrap_or_default();
    match page {
        "" => {
            let sid = format!("sess{}", state.cookies_issued.fetch_add(1, Ordering::SeqCst));
            state.rotate(&sid);
            (
                [(header::SET_COOKIE, format!("PHPSESSID={}; Path=/", sid))],
                axum::response::Html("<html><body>eCourts</body></html>"),
            )
                .into_response()
        }
        "cause_list/" => {
            let Some(sid) = session_of(&headers) else {
                return (StatusCode::FORBIDDEN, "no session").into_response();
            };
            let token = state.rotate(&sid);
            axum::response::Html(format!(
                r#"<html><body>
                <input type="hidden" id="app_token" name="app_token" value="{}">
                <select id="sess_state_code" name="state_code">
                  <option value="0">Select State</option>
                  <option value="4">Kerala</option>
                  <option value="3">Karnataka</option>
                </select>
                </body></html>"#,
                token
            ))
            .into_response()
        }
        "casestatus/getCaptcha" => {
            state.captchas_served.fetch_add(1, Ordering::SeqCst);
            ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown page").into_response(),
    }
}

async fn on_securimage() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES).into_response()
}

async fn on_post(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let page = query.get("p").cloned().unwrap_or_default();
    let Some(sid) = session_of(&headers) else {
        return (StatusCode::FORBIDDEN, "<h1>Forbidden</h1>").into_response();
    };
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

    let expected = state.token_of(&sid);
    let stale = state.expire_next.swap(false, Ordering::SeqCst);
    if stale || expected.as_deref() != Some(field("app_token")) {
        let fresh = state.rotate(&sid);
        return Json(json!({ "errormsg": "Invalid Request", "app_token": fresh })).into_response();
    }

    match page.as_str() {
        "casestatus/fillDistrict" => {
            let token = state.rotate(&sid);
            Json(json!({
                "dist_list": "<option value=''>Select District</option><option value='3'>Ernakulam</option><option value='7'>Kollam</option>",
                "app_token": token,
            }))
            .into_response()
        }
        "casestatus/fillcomplex" => {
            let token = state.rotate(&sid);
            Json(json!({
                "complex_list": "<option value='0'>Select Complex</option><option value='1040003@2,3@N'>Ernakulam District Court Complex</option>",
                "app_token": token,
            }))
            .into_response()
        }
        "cause_list/fillCauseList" if field("court_complex_code") == SHARED_NUMBER_COMPLEX => {
            let token = state.rotate(&sid);
            Json(json!({
                "court_list": "<option value=''>Select Court</option>\
                    <option value='1^7'>7-Munsiff Court</option>\
                    <option value='2^7'>7-Principal District Judge</option>",
                "app_token": token,
            }))
            .into_response()
        }
        "cause_list/fillCauseList" => {
            let token = state.rotate(&sid);
            Json(json!({
                "court_list": "<option value=''>Select Court</option>\
                    <option value='D' disabled>Civil Courts</option>\
                    <option value='2^7'>7-Principal District Judge</option>\
                    <option value='2^8'>8-Additional District Judge</option>",
                "app_token": token,
            }))
            .into_response()
        }
        "casestatus/set_data" => {
            let token = state.rotate(&sid);
            Json(json!({ "status": "1", "app_token": token })).into_response()
        }
        "cause_list/submitCauseList" => {
            state.submits.fetch_add(1, Ordering::SeqCst);
            if field("cause_list_captcha_code") != CAPTCHA_ANSWER {
                return Json(json!({ "errormsg": "Invalid Captcha", "app_token": state.rotate(&sid) }))
                    .into_response();
            }
            let token = state.rotate(&sid);
            if field("CL_court_no") == ERRORMSG_EMPTY_COURT {
                return Json(json!({ "errormsg": "No Record Found", "app_token": token })).into_response();
            }
            let case_data = match field("CL_court_no") {
                "2^7" => principal_court_list(field("causelist_date")),
                _ => "<div class='alert'>No Record Found</div>".to_string(),
            };
            Json(json!({ "case_data": case_data, "app_token": token })).into_response()
        }
        "cnr_status/searchByCNR/" => {
            if field("fcaptcha_code") != CAPTCHA_ANSWER {
                return Json(json!({ "errormsg": "Invalid Captcha", "app_token": state.rotate(&sid) }))
                    .into_response();
            }
            if field("cino") != KNOWN_CNR {
                let token = state.rotate(&sid);
                return Json(json!({ "errormsg": "This Case Code does not exists", "app_token": token }))
                    .into_response();
            }
            let token = state.rotate(&sid);
            Json(json!({ "casetype_list": case_details_page(), "app_token": token })).into_response()
        }
        "casestatus/submitCaseNo" => {
            if field("case_captcha_code") != CAPTCHA_ANSWER {
                return Json(json!({ "errormsg": "Invalid Captcha", "app_token": state.rotate(&sid) }))
                    .into_response();
            }
            if field("case_no") != "123" || field("rgyear") != "2024" {
                let token = state.rotate(&sid);
                return Json(json!({ "errormsg": "Record not found", "app_token": token })).into_response();
            }
            let token = state.rotate(&sid);
            Json(json!({ "case_data": case_details_page(), "app_token": token })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown endpoint").into_response(),
    }
}

fn principal_court_list(date: &str) -> String {
    format!(
        "<table>\
         <tr><th>Sr No</th><th>Cases</th><th>Party Name</th><th>Purpose</th></tr>\
         <tr><td colspan='4'>Cause list for {date}</td></tr>\
         <tr><td colspan='4'>Bench A</td></tr>\
         <tr><td>1</td><td>O.S./12/2024 View</td><td>Ravi vs Suresh</td><td>Evidence</td></tr>\
         <tr><td>2</td><td>O.S./15/2023<br>Next hearing date:- 21-11-2025</td><td>Anil vs State</td><td>Arguments</td></tr>\
         <tr><td colspan='4'>Bench B</td></tr>\
         <tr><td>3</td><td>M.C./88/2023</td><td>Meena vs Joseph</td><td>Evidence</td></tr>\
         </table>"
    )
}

/// Details page listing [`KNOWN_CNR`] for today
fn case_details_page() -> String {
    let today = chrono::Local::now().format("%d-%m-%Y");
    format!(
        "<table>\
         <tr><td>Case Type</td><td>O.S. - Original Suit</td></tr>\
         <tr><td>Filing Date</td><td>02-01-2024</td><td>Registration Number</td><td>123/2024</td></tr>\
         <tr><td>CNR Number</td><td>{KNOWN_CNR}</td></tr>\
         <tr><td>Next Hearing Date</td><td>{today}</td></tr>\
         <tr><td>Case Status</td><td>Pending</td></tr>\
         <tr><td>Sr No</td><td>14</td></tr>\
         </table>\
         <table>\
         <tr><td>Petitioner and Advocate</td><td>1) Ravi Kumar</td></tr>\
         <tr><td>Respondent and Advocate</td><td>1) Suresh Nair</td></tr>\
         </table>"
    )
}
