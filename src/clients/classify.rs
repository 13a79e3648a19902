//! Upstream reply classification
//!
//! The portal has no documented error contract: captcha failures, expired
//! tokens and plain errors arrive as JSON `errormsg` fields, HTML fragments
//! or whole error pages. Every call site funnels replies through [`classify`]
//! so a new error shape only has to be taught here.

use std::sync::LazyLock;

use regex::Regex;

use crate::clients::response::UpstreamResponse;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Phrases the portal uses when a captcha answer is refused
const CAPTCHA_REJECTION_PATTERNS: [&str; 10] = [
    "invalid captcha",
    "wrong captcha",
    "captcha mismatch",
    "captcha code is incorrect",
    "captcha does not match",
    "please enter valid captcha",
    "please enter captcha",
    "invalid verification code",
    "verification code incorrect",
    "captcha not matched",
];

/// Phrases signalling a dead session or stale anti-forgery token
const SESSION_EXPIRY_PATTERNS: [&str; 7] = [
    "session expired",
    "session has expired",
    "session timed out",
    "session timeout",
    "invalid app token",
    "invalid token",
    "token mismatch",
];

/// JSON keys that may carry an error text
const MESSAGE_KEYS: [&str; 6] = ["errormsg", "error", "message", "msg", "status", "case_data"];

/// Outcome of looking at one upstream reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing wrong that we can see
    Accepted,
    /// The captcha answer was refused
    InvalidCaptcha { message: String },
    /// The anti-forgery token is stale; the reply may carry its replacement
    ///
    /// `explicit` is false when staleness is only inferred from an `errormsg`
    /// that came with a rotated token. Such a reply may just as well be a
    /// plain refusal ("Record not found").
    TokenExpired {
        fresh_token: Option<String>,
        message: String,
        explicit: bool,
    },
    /// An explicit error that is neither of the above
    Rejected { message: String },
}

/// Map a raw upstream reply to one of the known failure kinds
pub fn classify(response: &UpstreamResponse) -> Verdict {
    if response.is_image() {
        return Verdict::Accepted;
    }

    let json = response.json();
    let haystack = match &json {
        Some(serde_json::Value::Object(map)) => MESSAGE_KEYS
            .iter()
            .filter_map(|k| map.get(*k).and_then(|v| v.as_str()))
            .collect::<Vec<_>>()
            .join(" "),
        Some(other) => other.to_string(),
        None => response.text(),
    };

    if mentions_captcha_rejection(&haystack) {
        return Verdict::InvalidCaptcha {
            message: first_message(response).unwrap_or_else(|| "Invalid captcha".to_string()),
        };
    }

    if let Some(errormsg) = response.json_str("errormsg").map(|m| strip_markup(&m)).filter(|m| !m.is_empty()) {
        let fresh_token = response.fresh_token();
        let explicit = mentions_session_expiry(&errormsg);
        if fresh_token.is_some() || explicit {
            return Verdict::TokenExpired {
                fresh_token,
                message: errormsg,
                explicit,
            };
        }
        return Verdict::Rejected { message: errormsg };
    }

    if json.is_none() && (matches!(response.status, 401 | 403 | 419) || mentions_session_expiry(&haystack)) {
        return Verdict::TokenExpired {
            fresh_token: None,
            message: format!("session rejected (HTTP {})", response.status),
            explicit: true,
        };
    }

    if response.status >= 400 {
        return Verdict::Rejected {
            message: format!("HTTP {}", response.status),
        };
    }

    Verdict::Accepted
}

/// Whether a text is a captcha refusal
///
/// Requires the word "captcha" (or "verification code") plus one of the
/// known refusal phrases, so a page that merely contains a captcha widget
/// does not count.
pub fn mentions_captcha_rejection(text: &str) -> bool {
    let text = strip_markup(text).to_lowercase();
    (text.contains("captcha") || text.contains("verification code"))
        && CAPTCHA_REJECTION_PATTERNS.iter().any(|p| text.contains(p))
}

pub fn mentions_session_expiry(text: &str) -> bool {
    let text = text.to_lowercase();
    SESSION_EXPIRY_PATTERNS.iter().any(|p| text.contains(p))
}

/// Human-readable error text of a reply, markup removed
fn first_message(response: &UpstreamResponse) -> Option<String> {
    response
        .json_str_any(&["errormsg", "error", "message", "msg"])
        .map(|m| strip_markup(&m))
        .filter(|m| !m.is_empty())
}

/// Drop tags and collapse whitespace
pub fn strip_markup(text: &str) -> String {
    TAG.replace_all(text, " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
