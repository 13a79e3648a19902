//! Cause-list table parsing
//!
//! The portal returns one or more tables per court. Rows are one of:
//!
//! - a column header (`Sr No | Cases | Party Name | Purpose`), skipped
//! - a section heading (one wide cell such as a bench name), which applies
//!   to every following case row until the next heading
//! - a case row (`Sr No | Case | Parties | Purpose | Court`, the last column
//!   optional)
//!
//! A page without any case row is only an empty list when it says so or
//! shows the column header of an empty listing; anything else is a captcha
//! rejection or an unknown shape.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::clients::classify::mentions_captcha_rejection;
use crate::error::{AppError, AppResult};
use crate::models::CaseRecord;
use crate::parsing::{element_text, html_to_text, row_cells, selector};

const ENDPOINT: &str = "cause_list/submitCauseList";

/// Texts the portal shows for a day without cases
const NO_RECORD_MARKERS: [&str; 4] = ["no record", "record not found", "no cases", "no case"];

static NEXT_HEARING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)next\s+hearing\s+date\s*:?").expect("next hearing pattern"));
static VIEW_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bview\b").expect("view link pattern"));

enum Row {
    Skip,
    /// Column labels of a cause-list table
    Header,
    Heading(String),
    Case {
        serial: String,
        case_cell: String,
        parties: String,
        purpose: String,
        court_name: Option<String>,
    },
}

/// Parse cause-list markup into ordered case records
pub fn parse_cause_list(markup: &str) -> AppResult<Vec<CaseRecord>> {
    let doc = Html::parse_document(markup);
    let row_sel = selector("tr")?;

    let mut records = Vec::new();
    let mut section: Option<String> = None;
    let mut ordinal = 0usize;
    let mut saw_header = false;

    for row in doc.select(&row_sel).filter(is_top_level_row) {
        match classify_row(&row) {
            Row::Skip => {}
            Row::Header => saw_header = true,
            Row::Heading(text) => {
                debug!("section heading: {}", text);
                section = Some(text);
            }
            Row::Case {
                serial,
                case_cell,
                parties,
                purpose,
                court_name,
            } => {
                let mut parts = NEXT_HEARING.splitn(&case_cell, 2);
                let head = parts.next().unwrap_or_default();
                let case_number = normalize(&VIEW_LINK.replace_all(head, " "));
                if case_number.is_empty() {
                    continue;
                }
                ordinal += 1;
                let hearing = parts
                    .next()
                    .map(|tail| normalize(tail.trim().trim_start_matches('-')))
                    .filter(|tail| !tail.is_empty());

                records.push(CaseRecord {
                    serial_number: if serial.is_empty() { ordinal.to_string() } else { serial },
                    case_number,
                    parties,
                    purpose,
                    section: section.clone(),
                    next_hearing: hearing,
                    court_name,
                });
            }
        }
    }

    if !records.is_empty() {
        debug!("parsed {} cause-list rows", records.len());
        return Ok(records);
    }

    if mentions_captcha_rejection(markup) {
        return Err(AppError::invalid_captcha("cause list page rejected the captcha"));
    }

    let text = html_to_text(markup).to_lowercase();
    if saw_header || NO_RECORD_MARKERS.iter().any(|m| text.contains(m)) {
        debug!("cause list has no cases");
        return Ok(Vec::new());
    }

    warn!("⚠️ cause-list markup has no case rows and no empty-list marker ({} bytes)", markup.len());
    Err(AppError::shape_changed(
        ENDPOINT,
        "no case rows and no empty-list message in the reply",
    ))
}

/// Rows of nested tables belong to a cell, not to the listing
fn is_top_level_row(row: &ElementRef<'_>) -> bool {
    row.ancestors()
        .filter(|node| node.value().as_element().map(|e| e.name() == "table").unwrap_or(false))
        .count()
        <= 1
}

fn classify_row(row: &ElementRef<'_>) -> Row {
    let cells = row_cells(row);
    if cells.is_empty() {
        return Row::Skip;
    }
    let texts: Vec<String> = cells.iter().map(element_text).collect();
    let non_empty: Vec<&String> = texts.iter().filter(|t| !t.is_empty()).collect();
    if non_empty.is_empty() {
        return Row::Skip;
    }

    let spans_columns = cells.iter().any(|c| {
        c.value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .map(|n| n > 1)
            .unwrap_or(false)
    });
    if cells.len() == 1 || (non_empty.len() == 1 && spans_columns) {
        let text = non_empty[0].to_string();
        if is_column_label(&text) {
            return Row::Header;
        }
        return Row::Heading(text);
    }

    if is_column_label(&texts[0]) || texts.iter().any(|t| t.to_lowercase().contains("party name")) {
        return Row::Header;
    }
    if cells.iter().all(|c| c.value().name() == "th") {
        return Row::Skip;
    }

    Row::Case {
        serial: texts[0].clone(),
        case_cell: texts.get(1).cloned().unwrap_or_default(),
        parties: texts.get(2).cloned().unwrap_or_default(),
        purpose: texts.get(3).cloned().unwrap_or_default(),
        court_name: texts.get(4).filter(|t| !t.is_empty()).cloned(),
    }
}

/// `Sr No`, `Sr.No.`, `S.No`, `Sl. No` style header cells
fn is_column_label(text: &str) -> bool {
    let compact: String = text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if compact.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    compact == "sr"
        || compact.starts_with("srno")
        || compact.starts_with("slno")
        || compact.starts_with("sno")
        || compact.starts_with("serial")
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_row(sr: u32) -> String {
        format!(
            "<tr><td>{sr}</td><td><a href='#'>View</a> O.S./{sr}/2024</td>\
             <td>Ravi<br>Versus<br>Kumar</td><td>Arguments</td></tr>"
        )
    }

    #[test]
    fn test_sections_follow_headings() {
        let mut html = String::from(
            "<table><thead><tr><th>Sr No</th><th>Cases</th><th>Party Name</th><th>Purpose</th></tr></thead><tbody>",
        );
        html.push_str("<tr><td colspan='4'>Bench A</td></tr>");
        for sr in 1..=3 {
            html.push_str(&case_row(sr));
        }
        html.push_str("<tr><td colspan='4'>Bench B</td></tr>");
        for sr in 4..=5 {
            html.push_str(&case_row(sr));
        }
        html.push_str("</tbody></table>");

        let records = parse_cause_list(&html).unwrap();
        assert_eq!(records.len(), 5);
        for r in &records[..3] {
            assert_eq!(r.section.as_deref(), Some("Bench A"));
        }
        for r in &records[3..] {
            assert_eq!(r.section.as_deref(), Some("Bench B"));
        }
        assert_eq!(records[0].case_number, "O.S./1/2024");
        assert_eq!(records[0].parties, "Ravi Versus Kumar");
        assert_eq!(records[4].serial_number, "5");
    }

    #[test]
    fn test_rows_before_any_heading_have_no_section() {
        let html = format!(
            "<table>{}<tr><td colspan='4'>Bench A</td></tr>{}</table>",
            case_row(1),
            case_row(2)
        );
        let records = parse_cause_list(&html).unwrap();
        assert_eq!(records[0].section, None);
        assert_eq!(records[1].section.as_deref(), Some("Bench A"));
    }

    #[test]
    fn test_next_hearing_split() {
        let html = "<table><tr><td>1</td>\
            <td>M.C./88/2023<br>Next hearing date:- 21-11-2025</td>\
            <td>A vs B</td><td>Evidence</td></tr>\
            <tr><td></td><td>CRL.P./5/2025</td><td>C vs D</td><td></td></tr></table>";
        let records = parse_cause_list(html).unwrap();
        assert_eq!(records[0].case_number, "M.C./88/2023");
        assert_eq!(records[0].next_hearing.as_deref(), Some("21-11-2025"));
        assert_eq!(records[1].next_hearing, None);
        // missing serial falls back to the row ordinal
        assert_eq!(records[1].serial_number, "2");
        assert_eq!(records[1].purpose, "");
    }

    #[test]
    fn test_explicit_no_records_is_empty() {
        let html = "<div class='alert'>No Record Found</div>";
        assert!(parse_cause_list(html).unwrap().is_empty());

        let header_only = "<table><tr><th>Sr No</th><th>Cases</th></tr></table>";
        assert!(parse_cause_list(header_only).unwrap().is_empty());
    }

    #[test]
    fn test_error_page_in_table_is_not_empty_list() {
        let oops = "<table><tr><td>Oops! Something went wrong. Please try again later</td></tr></table>";
        assert!(matches!(
            parse_cause_list(oops),
            Err(AppError::UpstreamShapeChanged { .. })
        ));

        // "not found" alone is not a no-record message
        let missing = "<table><tr><th>Error</th></tr><tr><th>Page not found</th></tr></table>";
        assert!(matches!(
            parse_cause_list(missing),
            Err(AppError::UpstreamShapeChanged { .. })
        ));

        assert!(parse_cause_list("   ").is_err());
    }

    #[test]
    fn test_court_name_column() {
        let html = "<table><tr><td>1</td><td>O.S./1/2024</td><td>A vs B</td><td>Hearing</td>\
            <td>Principal District Judge</td></tr>\
            <tr><td>2</td><td>O.S./2/2024</td><td>C vs D</td><td>Hearing</td><td> </td></tr></table>";
        let records = parse_cause_list(html).unwrap();
        assert_eq!(records[0].court_name.as_deref(), Some("Principal District Judge"));
        assert_eq!(records[1].court_name, None);
        assert_eq!(records[0].purpose, "Hearing");
    }

    #[test]
    fn test_captcha_page_is_not_empty_list() {
        let html = "<div>Invalid Captcha</div>";
        assert!(matches!(parse_cause_list(html), Err(AppError::InvalidCaptcha { .. })));
    }

    #[test]
    fn test_unknown_shape() {
        let html = "<div><h1>Maintenance</h1><p>Back soon</p></div>";
        assert!(matches!(
            parse_cause_list(html),
            Err(AppError::UpstreamShapeChanged { .. })
        ));
    }

    #[test]
    fn test_heading_mentioning_senior_is_kept() {
        let html = format!("<table><tr><td colspan='4'>Sr. Civil Judge Court</td></tr>{}</table>", case_row(1));
        let records = parse_cause_list(&html).unwrap();
        assert_eq!(records[0].section.as_deref(), Some("Sr. Civil Judge Court"));
    }

    #[test]
    fn test_nested_table_rows_ignored() {
        let html = "<table><tr><td>1</td><td>O.S./1/2024</td>\
            <td><table><tr><td>x</td><td>y</td></tr></table></td><td>Hearing</td></tr></table>";
        let records = parse_cause_list(html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parties, "x y");
    }
}
