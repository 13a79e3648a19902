//! Cause-list fetching - business capability layer
//!
//! One query, one submission. The browser's preflight calls are mirrored
//! first because the portal checks that they happened.

use tracing::{debug, info, warn};

use crate::clients::classify::strip_markup;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{CaptchaModule, CauseList, CauseListQuery};
use crate::parsing::parse_cause_list;
use crate::services::artifact_writer::ArtifactWriter;
use crate::services::jurisdiction::COURT_ENDPOINT;
use crate::services::session::{AuthenticatedContext, CaptchaSession, SessionManager};

const SET_DATA_ENDPOINT: &str = "casestatus/set_data";
const SUBMIT_ENDPOINT: &str = "cause_list/submitCauseList";
const DEBUG_FILE: &str = "last_causelist.html";

/// Rejection texts that mean "no cases that day"
const NO_RECORD_MARKERS: [&str; 4] = ["no record", "record not found", "no cases", "no case found"];

/// A parsed cause list plus the markup it came from
///
/// The markup is kept for rendering and diagnosis; it is not part of the
/// list value itself.
#[derive(Debug, Clone)]
pub struct FetchedCauseList {
    pub cause_list: CauseList,
    pub raw_html: String,
}

/// Cause-list fetcher
pub struct CauseListFetcher {
    artifacts: ArtifactWriter,
}

impl CauseListFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            artifacts: ArtifactWriter::new(config),
        }
    }

    pub fn with_artifacts(artifacts: ArtifactWriter) -> Self {
        Self { artifacts }
    }

    /// Validate the captcha and fetch one cause list
    pub async fn fetch(
        &self,
        sessions: &mut SessionManager,
        captcha: &CaptchaSession,
        query: &CauseListQuery,
    ) -> AppResult<FetchedCauseList> {
        require_cause_list_captcha(captcha)?;
        let mut ctx = sessions.validate_and_consume(captcha, query.captcha_answer())?;
        self.fetch_with(&mut ctx, query).await
    }

    /// Fetch using an already validated captcha
    ///
    /// # Arguments
    /// - `ctx`: authenticated upstream access
    /// - `query`: court, date and case kind
    ///
    /// # Returns
    /// The parsed list; zero cases is a valid, empty list
    pub async fn fetch_with(
        &self,
        ctx: &mut AuthenticatedContext<'_>,
        query: &CauseListQuery,
    ) -> AppResult<FetchedCauseList> {
        info!(
            "submitCauseList -> est={}, cicri={}, court={}, date={}",
            query.court_code().establishment(),
            query.case_kind().wire_code(),
            query.court_code(),
            query.date()
        );

        self.preflight(ctx, query).await;

        let fields = submit_fields(query, ctx.answer());
        let markup = match ctx.submit(SUBMIT_ENDPOINT, &fields).await {
            Ok(response) => match response.json() {
                Some(json) => case_markup(&json)?,
                None => response.text(),
            },
            Err(AppError::UpstreamRejected { message, .. }) if says_no_records(&message) => {
                info!("✓ upstream reports no cases: {}", message);
                return Ok(FetchedCauseList {
                    cause_list: CauseList::new(query.date(), query.case_kind(), Vec::new()),
                    raw_html: message,
                });
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.artifacts.write_debug_html(DEBUG_FILE, &markup).await {
            warn!("⚠️ could not save raw cause list: {}", e);
        }

        let records = match parse_cause_list(&markup) {
            Ok(records) => records,
            Err(e) => {
                if e.is_invalid_captcha() {
                    ctx.upstream().mark_dead();
                }
                return Err(e);
            }
        };

        let cause_list = CauseList::new(query.date(), query.case_kind(), records);
        info!("✓ {} cases for court {} on {}", cause_list.total_cases(), query.court_code(), query.date());
        Ok(FetchedCauseList {
            cause_list,
            raw_html: markup,
        })
    }

    /// `set_data` then `fillCauseList`, as the browser does; never fatal
    async fn preflight(&self, ctx: &mut AuthenticatedContext<'_>, query: &CauseListQuery) {
        let est = query.court_code().establishment().to_string();
        let set_data = [
            ("complex_code", format!("{}@{}@N", query.complex_code(), est)),
            ("selected_state_code", query.state_code().to_string()),
            ("selected_dist_code", query.dist_code().to_string()),
            ("selected_est_code", "null".to_string()),
        ];
        if let Err(e) = ctx.post(SET_DATA_ENDPOINT, &set_data).await {
            debug!("preflight {} failed: {}", SET_DATA_ENDPOINT, e);
        }

        let fill = [
            ("state_code", query.state_code().to_string()),
            ("dist_code", query.dist_code().to_string()),
            ("court_complex_code", query.complex_code().to_string()),
            ("est_code", est),
        ];
        if let Err(e) = ctx.post(COURT_ENDPOINT, &fill).await {
            debug!("preflight {} failed: {}", COURT_ENDPOINT, e);
        }
    }
}

fn submit_fields(query: &CauseListQuery, answer: &str) -> Vec<(&'static str, String)> {
    vec![
        ("CL_court_no", query.court_code().to_string()),
        ("causelist_date", query.date().to_string()),
        ("cause_list_captcha_code", answer.to_string()),
        (
            "court_name_txt",
            query.court_name().map(strip_markup).unwrap_or_default(),
        ),
        ("state_code", query.state_code().to_string()),
        ("dist_code", query.dist_code().to_string()),
        ("court_complex_code", query.complex_code().to_string()),
        ("est_code", "null".to_string()),
        ("cicri", query.case_kind().wire_code().to_string()),
        ("selprevdays", "0".to_string()),
    ]
}

/// Cause-list and case-status captchas are separate pools
pub fn require_cause_list_captcha(captcha: &CaptchaSession) -> AppResult<()> {
    if captcha.module != CaptchaModule::CauseList {
        return Err(AppError::invalid_captcha(format!(
            "captcha issued for {} cannot be used for cause lists",
            captcha.module
        )));
    }
    Ok(())
}

/// The `case_data` markup of a JSON submit reply
///
/// Refusals were already classified away, so anything but a string here is
/// a reply we do not understand.
fn case_markup(json: &serde_json::Value) -> AppResult<String> {
    match json.get("case_data") {
        Some(serde_json::Value::String(html)) => Ok(html.clone()),
        None | Some(serde_json::Value::Null) => {
            Err(AppError::shape_changed(SUBMIT_ENDPOINT, "JSON reply without case_data"))
        }
        Some(other) => Err(AppError::shape_changed(
            SUBMIT_ENDPOINT,
            format!("case_data is not markup: {}", other),
        )),
    }
}

fn says_no_records(message: &str) -> bool {
    let lower = message.to_lowercase();
    NO_RECORD_MARKERS.iter().any(|m| lower.contains(m))
}
