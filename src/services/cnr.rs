//! Case lookup - business capability layer
//!
//! CNR search and the case-number (type/number/year) search share one
//! captcha pool and one reply shape.

use tracing::{info, warn};

use crate::clients::UpstreamResponse;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{CaptchaModule, CaseNumberQuery, CnrRecord, WireDate};
use crate::parsing::parse_case_details;
use crate::services::artifact_writer::ArtifactWriter;
use crate::services::session::{AuthenticatedContext, CaptchaSession, SessionManager};

const CNR_ENDPOINT: &str = "cnr_status/searchByCNR/";
const CASE_NO_ENDPOINT: &str = "casestatus/submitCaseNo";

/// Upstream texts for "no such case"
const NOT_FOUND_MARKERS: [&str; 6] = [
    "does not exist",
    "not exists",
    "record not found",
    "no record",
    "case not found",
    "invalid cnr",
];

/// JSON fields that may carry the details markup
const DETAIL_KEYS: [&str; 4] = ["case_data", "casetype_list", "data", "html"];

/// CNR / case-number search
pub struct CnrSearch {
    artifacts: ArtifactWriter,
    reference_date: Option<WireDate>,
}

impl CnrSearch {
    pub fn new(config: &Config) -> Self {
        Self {
            artifacts: ArtifactWriter::new(config),
            reference_date: None,
        }
    }

    /// Judge listed-today/tomorrow against a fixed day instead of the clock
    pub fn with_reference_date(mut self, date: WireDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Look up a case by CNR
    ///
    /// # Arguments
    /// - `sessions`: the caller's session manager
    /// - `captcha`: a `CaseStatus` challenge
    /// - `cnr`: case number record, must be non-empty
    /// - `answer`: captcha answer
    pub async fn lookup(
        &self,
        sessions: &mut SessionManager,
        captcha: &CaptchaSession,
        cnr: &str,
        answer: &str,
    ) -> AppResult<CnrRecord> {
        let cnr = cnr.trim().to_uppercase();
        if cnr.is_empty() {
            return Err(AppError::invalid_request("cnr is required"));
        }
        check_module(captcha)?;
        let mut ctx = sessions.validate_and_consume(captcha, answer)?;
        self.lookup_with(&mut ctx, &cnr).await
    }

    pub async fn lookup_with(&self, ctx: &mut AuthenticatedContext<'_>, cnr: &str) -> AppResult<CnrRecord> {
        info!("🔍 CNR lookup {}", cnr);
        let form = [
            ("cino", cnr.to_string()),
            ("fcaptcha_code", ctx.answer().to_string()),
        ];
        let response = ctx.submit(CNR_ENDPOINT, &form).await.map_err(|e| not_found_or(e, cnr))?;
        self.read_record(&response, cnr).await
    }

    /// Look up a case by type, number and registration year
    pub async fn search_case_number(
        &self,
        sessions: &mut SessionManager,
        captcha: &CaptchaSession,
        query: &CaseNumberQuery,
        answer: &str,
    ) -> AppResult<CnrRecord> {
        for (field, value) in [
            ("state_code", &query.state_code),
            ("dist_code", &query.dist_code),
            ("court_complex_code", &query.court_complex_code),
            ("case_type", &query.case_type),
            ("case_number", &query.case_number),
            ("year", &query.year),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid_request(format!("{} is required", field)));
            }
        }
        check_module(captcha)?;

        let reference = format!("{}/{}/{}", query.case_type, query.case_number, query.year);
        let mut ctx = sessions.validate_and_consume(captcha, answer)?;
        info!("🔍 case-number lookup {}", reference);
        let form = [
            ("state_code", query.state_code.clone()),
            ("dist_code", query.dist_code.clone()),
            ("court_complex_code", query.court_complex_code.clone()),
            ("est_code", query.est_code.clone()),
            ("case_type", query.case_type.clone()),
            ("case_no", query.case_number.clone()),
            ("rgyear", query.year.clone()),
            ("case_captcha_code", ctx.answer().to_string()),
        ];
        let response = ctx
            .submit(CASE_NO_ENDPOINT, &form)
            .await
            .map_err(|e| not_found_or(e, &reference))?;
        self.read_record(&response, &reference).await
    }

    async fn read_record(&self, response: &UpstreamResponse, reference: &str) -> AppResult<CnrRecord> {
        let markup = response
            .json_str_any(&DETAIL_KEYS)
            .unwrap_or_else(|| response.searchable_text());

        let today = self.reference_date.unwrap_or_else(WireDate::today);
        match parse_case_details(&markup, today) {
            Some(record) => {
                info!(
                    "✓ found {} (today: {}, tomorrow: {})",
                    record.case_number, record.is_listed_today, record.is_listed_tomorrow
                );
                Ok(record)
            }
            None => {
                if mentions_not_found(&markup) {
                    info!("upstream has no case {}", reference);
                }
                if let Err(e) = self.artifacts.write_debug_html("last_case_lookup.html", &markup).await {
                    warn!("⚠️ could not save lookup reply: {}", e);
                }
                Err(AppError::case_not_found(reference))
            }
        }
    }
}

fn check_module(captcha: &CaptchaSession) -> AppResult<()> {
    if captcha.module != CaptchaModule::CaseStatus {
        return Err(AppError::invalid_captcha(format!(
            "captcha issued for {} cannot be used for case lookups",
            captcha.module
        )));
    }
    Ok(())
}

/// Explicit "no such case" rejections become `CaseNotFound`
fn not_found_or(err: AppError, reference: &str) -> AppError {
    match err {
        AppError::UpstreamRejected { ref message, .. } if mentions_not_found(message) => {
            AppError::case_not_found(reference)
        }
        other => other,
    }
}

fn mentions_not_found(text: &str) -> bool {
    let lower = crate::clients::classify::strip_markup(text).to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m))
}
