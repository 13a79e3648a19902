//! Jurisdiction hierarchy - business capability layer
//!
//! State → district → complex → court, fetched live. Results are cached
//! only for the lifetime of one resolver, i.e. one resolution chain.

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::clients::UpstreamResponse;
use crate::error::{AppError, AppResult};
use crate::models::{CourtCode, JurisdictionLevel, JurisdictionNode};
use crate::parsing::{parse_complex_options, parse_court_options, parse_district_options, parse_state_select};
use crate::services::session::SessionManager;

const DISTRICT_ENDPOINT: &str = "casestatus/fillDistrict";
const COMPLEX_ENDPOINT: &str = "casestatus/fillcomplex";
pub(crate) const COURT_ENDPOINT: &str = "cause_list/fillCauseList";

/// Jurisdiction resolver
pub struct JurisdictionResolver<'a> {
    sessions: &'a mut SessionManager,
    cache: HashMap<(JurisdictionLevel, String), Vec<JurisdictionNode>>,
}

impl<'a> JurisdictionResolver<'a> {
    pub fn new(sessions: &'a mut SessionManager) -> Self {
        Self {
            sessions,
            cache: HashMap::new(),
        }
    }

    pub async fn list_states(&mut self) -> AppResult<Vec<JurisdictionNode>> {
        let key = (JurisdictionLevel::State, String::new());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let html = self.sessions.upstream().await?.landing_page().await?;
        let nodes = non_empty(parse_state_select(&html)?, "cause_list/", JurisdictionLevel::State)?;
        self.cache.insert(key, nodes.clone());
        Ok(nodes)
    }

    pub async fn list_districts(&mut self, state_code: &str) -> AppResult<Vec<JurisdictionNode>> {
        require("state_code", state_code)?;
        let key = (JurisdictionLevel::District, state_code.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let form = [("state_code", state_code.to_string())];
        let response = self.sessions.upstream().await?.post(DISTRICT_ENDPOINT, &form).await?;
        let markup = option_markup(&response, &["dist_list"], DISTRICT_ENDPOINT)?;
        let nodes = non_empty(parse_district_options(&markup)?, DISTRICT_ENDPOINT, JurisdictionLevel::District)?;
        self.cache.insert(key, nodes.clone());
        Ok(nodes)
    }

    pub async fn list_complexes(&mut self, state_code: &str, dist_code: &str) -> AppResult<Vec<JurisdictionNode>> {
        require("state_code", state_code)?;
        require("dist_code", dist_code)?;
        let key = (JurisdictionLevel::Complex, format!("{}/{}", state_code, dist_code));
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let form = [
            ("state_code", state_code.to_string()),
            ("dist_code", dist_code.to_string()),
        ];
        let response = self.sessions.upstream().await?.post(COMPLEX_ENDPOINT, &form).await?;
        let markup = option_markup(&response, &["complex_list", "court_complex_list"], COMPLEX_ENDPOINT)?;
        let nodes = non_empty(parse_complex_options(&markup)?, COMPLEX_ENDPOINT, JurisdictionLevel::Complex)?;
        self.cache.insert(key, nodes.clone());
        Ok(nodes)
    }

    pub async fn list_courts(
        &mut self,
        state_code: &str,
        dist_code: &str,
        complex_code: &str,
    ) -> AppResult<Vec<JurisdictionNode>> {
        require("state_code", state_code)?;
        require("dist_code", dist_code)?;
        require("complex_code", complex_code)?;
        let key = (
            JurisdictionLevel::Court,
            format!("{}/{}/{}", state_code, dist_code, complex_code),
        );
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let form = [
            ("state_code", state_code.to_string()),
            ("dist_code", dist_code.to_string()),
            ("court_complex_code", complex_code.to_string()),
            ("est_code", "undefined".to_string()),
            ("search_act", "undefined".to_string()),
        ];
        let response = self.sessions.upstream().await?.post(COURT_ENDPOINT, &form).await?;
        let markup = option_markup(&response, &["court_list", "est_list"], COURT_ENDPOINT)?;
        let nodes = non_empty(parse_court_options(&markup)?, COURT_ENDPOINT, JurisdictionLevel::Court)?;
        info!("✓ {} courts in complex {}", nodes.len(), complex_code);
        self.cache.insert(key, nodes.clone());
        Ok(nodes)
    }

    /// Qualify a court code with its establishment id
    ///
    /// A code that already carries the separator is taken as is. A bare court
    /// number is looked up in the live court list; it is never guessed.
    pub async fn resolve_court(
        &mut self,
        state_code: &str,
        dist_code: &str,
        complex_code: &str,
        court_code: &str,
    ) -> AppResult<(CourtCode, Option<String>)> {
        let court_code = court_code.trim();
        require("court_code", court_code)?;
        if let Ok(code) = CourtCode::parse(court_code) {
            return Ok((code, None));
        }

        debug!("court code '{}' is bare, re-resolving", court_code);
        let courts = self.list_courts(state_code, dist_code, complex_code).await?;
        let (code, node) = match_court(&courts, court_code, complex_code)?;
        debug!("court {} resolved to {}", court_code, code);
        Ok((code, Some(node.name.clone())))
    }
}

/// The single listed court whose number is `court_number`
///
/// Two establishments of one complex may reuse a court number; that is
/// refused with the candidates named rather than picking one.
fn match_court<'a>(
    courts: &'a [JurisdictionNode],
    court_number: &str,
    complex_code: &str,
) -> AppResult<(CourtCode, &'a JurisdictionNode)> {
    let mut hits: Vec<(CourtCode, &JurisdictionNode)> = courts
        .iter()
        .filter_map(|node| CourtCode::parse(&node.code).ok().map(|code| (code, node)))
        .filter(|(code, _)| code.court_number() == court_number)
        .collect();

    match hits.len() {
        0 => Err(AppError::invalid_request(format!(
            "court '{}' is not listed in complex {}",
            court_number, complex_code
        ))),
        1 => Ok(hits.remove(0)),
        _ => {
            let candidates: Vec<&str> = hits.iter().map(|(code, _)| code.as_str()).collect();
            Err(AppError::invalid_request(format!(
                "court '{}' is ambiguous in complex {}: use one of {}",
                court_number,
                complex_code,
                candidates.join(", ")
            )))
        }
    }
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_request(format!("{} is required", field)));
    }
    Ok(())
}

/// `<option>` markup from a JSON field or the raw body
fn option_markup(response: &UpstreamResponse, keys: &[&str], endpoint: &str) -> AppResult<String> {
    if let Some(markup) = response.json_str_any(keys) {
        return Ok(markup);
    }
    let text = response.text();
    if text.contains("<option") {
        return Ok(text);
    }
    error!("{} reply has no option list: {}", endpoint, crate::utils::logging::truncate_text(&text, 200));
    Err(AppError::shape_changed(endpoint, format!("expected one of {:?} or <option> markup", keys)))
}

fn non_empty(
    nodes: Vec<JurisdictionNode>,
    endpoint: &str,
    level: JurisdictionLevel,
) -> AppResult<Vec<JurisdictionNode>> {
    if nodes.is_empty() {
        error!("{} returned no {} entries", endpoint, level);
        return Err(AppError::shape_changed(endpoint, format!("no {} entries in the reply", level)));
    }
    Ok(nodes)
}
