//! Upstream markup extraction
//!
//! Pure functions from upstream HTML/JSON text to model values. Nothing here
//! touches the network, so every rule is unit-tested against literal markup.
//!
//! `scraper::Html` is not `Send`; keep parsed documents inside these sync
//! functions and never hold one across an `.await`.

pub mod captcha;
pub mod case_details;
pub mod causelist;
pub mod options;
pub mod token;

pub use captcha::find_captcha_src;
pub use case_details::parse_case_details;
pub use causelist::parse_cause_list;
pub use options::{parse_complex_options, parse_court_options, parse_district_options, parse_state_select};
pub use token::extract_app_token;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, AppResult};

/// Compile a CSS selector
pub(crate) fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::Other(format!("bad selector '{}': {:?}", css, e)))
}

/// Collapse all whitespace runs (including `&nbsp;`) into single spaces
pub fn normalize_ws(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of an element, whitespace-normalised
///
/// Text nodes are joined with a space so `A<br>B` reads `A B`.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// Visible text of a markup fragment
pub fn html_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    normalize_ws(&fragment.root_element().text().collect::<String>())
}

/// Direct `td`/`th` children of a table row
///
/// `tr td` would also match cells of tables nested inside a cell.
pub(crate) fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| matches!(child.value().name(), "td" | "th"))
        .collect()
}
