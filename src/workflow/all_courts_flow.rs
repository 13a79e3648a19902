//! All-courts flow - workflow layer
//!
//! Fetches every court of one complex with a single captcha and bundles the
//! results into an archive.
//!
//! Order:
//! 1. list the complex's courts (no captcha needed)
//! 2. validate the captcha once
//! 3. fetch each court; a refused captcha aborts, any other failure skips
//!    the court
//! 4. render the archive

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{CaseKind, CauseListQuery, CourtCode, WireDate};
use crate::render::{CourtListing, DocumentRenderer};
use crate::services::causelist::require_cause_list_captcha;
use crate::services::{CaptchaSession, CauseListFetcher, JurisdictionResolver, SessionManager};
use crate::workflow::court_ctx::CourtCtx;

/// Parameters of an all-courts run
#[derive(Debug, Clone)]
pub struct AllCourtsRequest {
    pub state_code: String,
    pub dist_code: String,
    pub complex_code: String,
    pub date: WireDate,
    pub case_kind: CaseKind,
    pub captcha_answer: String,
}

/// All-courts flow
///
/// - decides the per-court order and the abort/skip policy
/// - holds no upstream session of its own
pub struct AllCourtsFlow {
    fetcher: CauseListFetcher,
    renderer: DocumentRenderer,
}

impl AllCourtsFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            fetcher: CauseListFetcher::new(config),
            renderer: DocumentRenderer::from_config(config),
        }
    }

    pub fn with_parts(fetcher: CauseListFetcher, renderer: DocumentRenderer) -> Self {
        Self { fetcher, renderer }
    }

    /// Fetch and render every court into one ZIP
    pub async fn run(
        &self,
        sessions: &mut SessionManager,
        captcha: &CaptchaSession,
        request: &AllCourtsRequest,
    ) -> AppResult<Vec<u8>> {
        let listings = self.collect(sessions, captcha, request).await?;
        self.renderer.render_archive(&listings).await
    }

    /// Fetch every court of the complex
    ///
    /// # Returns
    /// One listing per court, in court-list order
    pub async fn collect(
        &self,
        sessions: &mut SessionManager,
        captcha: &CaptchaSession,
        request: &AllCourtsRequest,
    ) -> AppResult<Vec<CourtListing>> {
        require_cause_list_captcha(captcha)?;
        let courts = JurisdictionResolver::new(sessions)
            .list_courts(&request.state_code, &request.dist_code, &request.complex_code)
            .await?;
        info!("🚀 fetching {} courts of complex {}", courts.len(), request.complex_code);

        let mut ctx = sessions.validate_and_consume(captcha, &request.captcha_answer)?;
        let total = courts.len();
        let mut listings = Vec::with_capacity(total);

        for (idx, court) in courts.into_iter().enumerate() {
            let court_ctx = CourtCtx::new(idx + 1, total, court.code.clone(), court.name.clone());

            let court_code = match CourtCode::parse(&court.code) {
                Ok(code) => code,
                Err(e) => {
                    warn!("{} ⚠️ skipped: {}", court_ctx, e);
                    listings.push(CourtListing::failed(court.code, court.name, e.to_string()));
                    continue;
                }
            };

            let query = CauseListQuery::new(
                request.state_code.clone(),
                request.dist_code.clone(),
                request.complex_code.clone(),
                court_code,
                request.date,
                request.case_kind,
                request.captcha_answer.clone(),
                Some(court.name.clone()),
            );

            match self.fetcher.fetch_with(&mut ctx, &query).await {
                Ok(fetched) => {
                    info!("{} ✓ {} cases", court_ctx, fetched.cause_list.total_cases());
                    listings.push(CourtListing::fetched(court.code, court.name, fetched.cause_list));
                }
                Err(e @ AppError::InvalidCaptcha { .. }) => {
                    error!("{} captcha refused, aborting the run", court_ctx);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} ⚠️ skipped: {}", court_ctx, e);
                    listings.push(CourtListing::failed(court.code, court.name, e.to_string()));
                }
            }
        }

        Ok(listings)
    }
}
