//! Case status page parsing
//!
//! Detail pages are label/value tables. A row may hold one pair
//! (`Case Type | O.S.`) or two (`Filing Number | 12 | Filing Date | 01-02-2020`).

use scraper::Html;

use crate::models::{CnrRecord, WireDate};
use crate::parsing::{element_text, row_cells, selector};

#[derive(Default)]
struct Fields {
    case_number: Option<String>,
    registration_number: Option<String>,
    cnr_number: Option<String>,
    case_type: Option<String>,
    filing_date: Option<String>,
    petitioner: Option<String>,
    respondent: Option<String>,
    court_name: Option<String>,
    judge_name: Option<String>,
    next_hearing: Option<String>,
    status: Option<String>,
    serial: Option<String>,
}

impl Fields {
    fn assign(&mut self, label: &str, value: String) {
        let slot = if label.contains("case number") || label.contains("case no") {
            &mut self.case_number
        } else if label.contains("registration") && (label.contains("number") || label.contains("no")) {
            &mut self.registration_number
        } else if label.contains("cnr") {
            &mut self.cnr_number
        } else if label.contains("case type") {
            &mut self.case_type
        } else if label.contains("filing") && label.contains("date") {
            &mut self.filing_date
        } else if label.contains("petitioner") || label.contains("plaintiff") {
            &mut self.petitioner
        } else if label.contains("respondent") || label.contains("defendant") || label.contains("accused") {
            &mut self.respondent
        } else if label.contains("court") && label.contains("name") {
            &mut self.court_name
        } else if label.contains("judge") || label.contains("coram") {
            &mut self.judge_name
        } else if label.contains("next") && (label.contains("date") || label.contains("hearing")) {
            &mut self.next_hearing
        } else if label.contains("sr no") || label.contains("serial") || label.contains("item no") {
            &mut self.serial
        } else if label.contains("status") || label.contains("stage") {
            &mut self.status
        } else {
            return;
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Extract a case record from a status page
///
/// Returns `None` when the page names no case. Listed-today/tomorrow are
/// judged against `today`; the serial is kept only for a listed case.
pub fn parse_case_details(html: &str, today: WireDate) -> Option<CnrRecord> {
    let doc = Html::parse_document(html);
    let row_sel = selector("tr").ok()?;
    let mut fields = Fields::default();

    for row in doc.select(&row_sel) {
        let cells = row_cells(&row);
        for pair in cells.chunks(2) {
            let [label, value] = pair else { continue };
            let label = element_text(label).to_lowercase();
            let value = element_text(value);
            let value = value.trim_start_matches(':').trim().to_string();
            if label.is_empty() || value.is_empty() || value == "-" {
                continue;
            }
            fields.assign(&label, value);
        }
    }

    let case_number = fields
        .case_number
        .or(fields.registration_number)
        .or(fields.cnr_number)?;

    let hearing_day = fields.next_hearing.as_deref().and_then(WireDate::parse_loose);
    let is_listed_today = hearing_day == Some(today);
    let is_listed_tomorrow = hearing_day == Some(today.next_day());
    let serial_number = if is_listed_today || is_listed_tomorrow {
        fields.serial
    } else {
        None
    };

    Some(CnrRecord {
        case_number,
        case_type: fields.case_type,
        filing_date: fields.filing_date,
        petitioner: fields.petitioner,
        respondent: fields.respondent,
        court_name: fields.court_name,
        judge_name: fields.judge_name,
        next_hearing: fields.next_hearing,
        status: fields.status,
        is_listed_today,
        is_listed_tomorrow,
        serial_number,
    })
}
