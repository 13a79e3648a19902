//! Captcha/session management - business capability layer
//!
//! Owns the upstream cookie jar and anti-forgery token for one logical
//! caller. Concurrency isolation comes from giving every caller its own
//! [`SessionManager`]; nothing in here is shared between managers.
//!
//! Lifecycle:
//!
//! ```text
//! issue(module) ──► CaptchaSession ──► validate_and_consume(session, answer)
//!                                             │
//!                                             ▼
//!                                  AuthenticatedContext ──► post(..) with the answer
//! ```
//!
//! Issuing a captcha replaces the active ticket of that module; a consumed or
//! replaced ticket is refused with `InvalidCaptcha`. A rejected captcha, or a
//! token that stays stale after one rotation, kills the upstream session and
//! the next `issue` starts over with a new cookie and token.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::clients::{classify, EcourtsClient, UpstreamResponse, Verdict};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::CaptchaModule;
use crate::parsing::{extract_app_token, find_captcha_src};
use crate::utils::logging::truncate_text;

const LANDING_PAGE: &str = "cause_list/";
const CAPTCHA_ENDPOINT: &str = "casestatus/getCaptcha";

/// One upstream cookie + token pair
pub struct UpstreamSession {
    client: EcourtsClient,
    app_token: String,
    established_at: Instant,
    dead: bool,
}

impl UpstreamSession {
    /// Open a fresh upstream session
    ///
    /// `GET /` for the cookie, then the cause-list landing page for the token.
    pub async fn establish(config: &Config) -> AppResult<Self> {
        let client = EcourtsClient::new(config)?;
        let base = format!("{}/", client.base_url());
        client.get_url(&base, None).await?;

        let landing = client.get_page(LANDING_PAGE, &[], Some(&base)).await?;
        let app_token = extract_app_token(&landing.url, &landing.text()).ok_or_else(|| {
            AppError::shape_changed(LANDING_PAGE, "no app_token on the cause list page")
        })?;

        info!("✓ upstream session established (token {})", truncate_text(&app_token, 8));
        Ok(Self {
            client,
            app_token,
            established_at: Instant::now(),
            dead: false,
        })
    }

    pub fn client(&self) -> &EcourtsClient {
        &self.client
    }

    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn mark_dead(&mut self) {
        if !self.dead {
            debug!("upstream session marked dead");
        }
        self.dead = true;
    }

    /// Alive and younger than `max_age`
    pub fn is_usable(&self, max_age: Duration) -> bool {
        !self.dead && self.established_at.elapsed() < max_age
    }

    /// Landing page markup (carries the state list)
    pub async fn landing_page(&mut self) -> AppResult<String> {
        let landing = self.client.get_page(LANDING_PAGE, &[], None).await?;
        let html = landing.text();
        if let Some(token) = extract_app_token(&landing.url, &html) {
            self.app_token = token;
        }
        Ok(html)
    }

    /// POST without a captcha answer
    pub async fn post(&mut self, page: &str, fields: &[(&str, String)]) -> AppResult<UpstreamResponse> {
        self.post_classified(page, fields, false).await
    }

    /// POST with token handling
    ///
    /// Every form carries `ajax_req` and the current token. A stale token is
    /// rotated (from the reply, else from the landing page) and the call is
    /// repeated exactly once. A refused captcha is never repeated. An `errormsg`
    /// that survives the rotation without claiming expiry is a plain refusal.
    async fn post_classified(
        &mut self,
        page: &str,
        fields: &[(&str, String)],
        captcha_bound: bool,
    ) -> AppResult<UpstreamResponse> {
        let mut rotated = false;
        loop {
            let mut form: Vec<(&str, String)> = fields.to_vec();
            form.push(("ajax_req", "true".to_string()));
            form.push(("app_token", self.app_token.clone()));

            let response = self.client.post_form(page, &form).await?;

            match classify(&response) {
                Verdict::Accepted => {
                    self.adopt_token(&response);
                    return Ok(response);
                }
                Verdict::InvalidCaptcha { message } => {
                    warn!("⚠️ {} refused the captcha: {}", page, message);
                    self.mark_dead();
                    return Err(AppError::invalid_captcha(message));
                }
                Verdict::TokenExpired {
                    fresh_token,
                    message,
                    explicit,
                } => {
                    if rotated && !explicit {
                        // same errormsg with a fresh token twice: an answer, not staleness
                        debug!("{} refused after rotation: {}", page, message);
                        self.adopt_token(&response);
                        return Err(AppError::upstream_rejected(page, message));
                    }
                    if rotated {
                        warn!("⚠️ {} token still stale after rotation: {}", page, message);
                        self.mark_dead();
                        return Err(if captcha_bound {
                            AppError::invalid_captcha(format!("session expired: {}", message))
                        } else {
                            AppError::upstream_rejected(page, format!("session expired: {}", message))
                        });
                    }
                    rotated = true;
                    self.rotate_token(fresh_token).await?;
                    debug!("{} retrying once with rotated token", page);
                }
                Verdict::Rejected { message } => {
                    // Refusals without a token problem ("Record not found",
                    // "This Case Code does not exists") are answers about the
                    // request. Session failures come back as TokenExpired and
                    // kill the session above.
                    self.adopt_token(&response);
                    return Err(AppError::upstream_rejected(page, message));
                }
            }
        }
    }

    async fn rotate_token(&mut self, fresh: Option<String>) -> AppResult<()> {
        let token = match fresh {
            Some(token) => token,
            None => {
                let landing = self.client.get_page(LANDING_PAGE, &[], None).await?;
                extract_app_token(&landing.url, &landing.text()).ok_or_else(|| {
                    AppError::shape_changed(LANDING_PAGE, "no app_token while rotating")
                })?
            }
        };
        if token == self.app_token {
            self.mark_dead();
            return Err(AppError::upstream_rejected(
                LANDING_PAGE,
                "upstream handed back the stale token",
            ));
        }
        debug!("token rotated to {}", truncate_text(&token, 8));
        self.app_token = token;
        Ok(())
    }

    fn adopt_token(&mut self, response: &UpstreamResponse) {
        if let Some(token) = response.fresh_token() {
            self.app_token = token;
        }
    }

    /// Fetch a captcha image for `module`
    ///
    /// The endpoint may answer with the image itself, with JSON/HTML that
    /// points at it, or with nothing usable, in which case the securimage
    /// renderer is asked directly.
    async fn fetch_captcha(&mut self, module: CaptchaModule) -> AppResult<(Vec<u8>, String)> {
        let referer = self.client.page_url(module.referer_page());
        let stamp = Local::now().timestamp_millis().to_string();
        let query = [
            ("ajax_req", "true".to_string()),
            ("app_token", self.app_token.clone()),
            ("_", stamp.clone()),
        ];
        let response = self
            .client
            .get_page(CAPTCHA_ENDPOINT, &query, Some(&referer))
            .await?;
        if response.is_image() {
            return Ok(image_of(response));
        }
        self.adopt_token(&response);

        let mut candidates = Vec::new();
        if let Some(src) = find_captcha_src(&response.text()) {
            candidates.push(self.client.resolve(&src)?);
        }
        candidates.push(self.client.resolve(&format!("securimage/securimage_show.php?sid={}", stamp))?);

        for url in candidates {
            match self.client.get_url(&url, Some(&referer)).await {
                Ok(image) if image.is_image() => return Ok(image_of(image)),
                Ok(other) => debug!("{} is not an image ({})", url, other.content_type),
                Err(e) => debug!("captcha fetch from {} failed: {}", url, e),
            }
        }

        Err(AppError::shape_changed(CAPTCHA_ENDPOINT, "no captcha image in the reply"))
    }
}

fn image_of(response: UpstreamResponse) -> (Vec<u8>, String) {
    let content_type = if response.content_type.to_ascii_lowercase().starts_with("image/") {
        response.content_type
    } else {
        "image/png".to_string()
    };
    (response.body, content_type)
}

/// A captcha challenge handed to a caller
///
/// Replaced, never mutated: a refresh yields a new value and the old one is
/// refused from then on.
#[derive(Debug, Clone)]
pub struct CaptchaSession {
    pub token: String,
    pub image: Vec<u8>,
    pub content_type: String,
    pub issued_at: DateTime<Local>,
    pub module: CaptchaModule,
    ticket: u64,
}

/// Upstream access carrying a validated captcha answer
///
/// Exists only between `validate_and_consume` and the end of the operation
/// that uses it; it borrows the manager mutably, so no other operation can
/// touch the same token meanwhile.
pub struct AuthenticatedContext<'a> {
    upstream: &'a mut UpstreamSession,
    answer: String,
    module: CaptchaModule,
}

impl<'a> AuthenticatedContext<'a> {
    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn module(&self) -> CaptchaModule {
        self.module
    }

    /// POST whose form embeds the captcha answer
    pub async fn submit(&mut self, page: &str, fields: &[(&str, String)]) -> AppResult<UpstreamResponse> {
        self.upstream.post_classified(page, fields, true).await
    }

    /// Preflight or follow-up call that does not carry the answer
    pub async fn post(&mut self, page: &str, fields: &[(&str, String)]) -> AppResult<UpstreamResponse> {
        self.upstream.post(page, fields).await
    }

    pub fn upstream(&mut self) -> &mut UpstreamSession {
        &mut *self.upstream
    }
}

/// Captcha/session manager for one logical caller
pub struct SessionManager {
    config: Config,
    upstream: Option<UpstreamSession>,
    active: HashMap<CaptchaModule, u64>,
    next_ticket: u64,
}

impl SessionManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            upstream: None,
            active: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue a fresh captcha for `module`
    ///
    /// # Arguments
    /// - `module`: captcha pool to draw from
    ///
    /// # Returns
    /// The new challenge; any earlier challenge of the same module is void
    pub async fn issue(&mut self, module: CaptchaModule) -> AppResult<CaptchaSession> {
        self.active.remove(&module);

        let upstream = self.upstream().await?;
        let (image, content_type) = upstream.fetch_captcha(module).await?;

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.active.insert(module, ticket);

        info!("✓ captcha issued for {} ({} bytes)", module, image.len());
        Ok(CaptchaSession {
            token: format!("{}-{}-{}", module.wire_name(), ticket, Local::now().timestamp_millis()),
            image,
            content_type,
            issued_at: Local::now(),
            module,
            ticket,
        })
    }

    /// Accept a challenge answer for exactly one authenticated operation
    ///
    /// Fails with `InvalidCaptcha` if the challenge was replaced, already
    /// used, or its upstream session died. The answer itself is judged by the
    /// upstream on the next call made through the returned context.
    pub fn validate_and_consume(
        &mut self,
        session: &CaptchaSession,
        answer: &str,
    ) -> AppResult<AuthenticatedContext<'_>> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AppError::invalid_request("captcha answer is required"));
        }

        if self.active.get(&session.module) != Some(&session.ticket) {
            return Err(AppError::invalid_captcha(
                "captcha was refreshed or already used; fetch a new one",
            ));
        }
        self.active.remove(&session.module);

        let upstream = match self.upstream.as_mut() {
            Some(upstream) if !upstream.is_dead() => upstream,
            _ => {
                return Err(AppError::invalid_captcha(
                    "upstream session expired; fetch a new captcha",
                ))
            }
        };

        Ok(AuthenticatedContext {
            upstream,
            answer: answer.to_string(),
            module: session.module,
        })
    }

    /// Live upstream session for calls that need no captcha
    ///
    /// Opens a new one if there is none, or the current one is dead or older
    /// than the configured maximum age. Opening a new session voids every
    /// outstanding captcha.
    pub async fn upstream(&mut self) -> AppResult<&mut UpstreamSession> {
        let max_age = self.config.session_max_age();
        let usable = self
            .upstream
            .as_ref()
            .map(|u| u.is_usable(max_age))
            .unwrap_or(false);

        if !usable {
            if self.upstream.is_some() {
                info!("upstream session stale or dead, establishing a new one");
            }
            self.active.clear();
            self.upstream = None;
            self.upstream = Some(UpstreamSession::establish(&self.config).await?);
        }

        self.upstream
            .as_mut()
            .ok_or_else(|| AppError::Other("upstream session missing after establish".into()))
    }

    /// Drop the upstream session; the next call starts over
    pub fn invalidate(&mut self) {
        if let Some(upstream) = self.upstream.as_mut() {
            upstream.mark_dead();
        }
        self.active.clear();
    }
}
