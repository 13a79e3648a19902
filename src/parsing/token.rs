//! Anti-forgery token discovery

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::parsing::selector;

static SCRIPT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"app_token\s*[:=]\s*["']([0-9A-Za-z]+)["']"#).expect("script token pattern")
});
static LOOSE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"app_token=([0-9a-fA-F]{8,})").expect("loose token pattern"));

/// Find the portal's `app_token` in a landing page
///
/// Tried in order: the final URL's query string, a hidden input, an inline
/// script assignment, then any `app_token=<hex>` in the text.
pub fn extract_app_token(final_url: &str, html: &str) -> Option<String> {
    if let Some(token) = from_url(final_url) {
        return Some(token);
    }

    if let Some(token) = from_hidden_input(html) {
        return Some(token);
    }

    if let Some(caps) = SCRIPT_TOKEN.captures(html) {
        return Some(caps[1].to_string());
    }

    LOOSE_TOKEN.captures(html).map(|caps| caps[1].to_string())
}

fn from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "app_token")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

fn from_hidden_input(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let sel = selector("input#app_token, input[name='app_token']").ok()?;
    doc.select(&sel)
        .filter_map(|input| input.value().attr("value"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}
