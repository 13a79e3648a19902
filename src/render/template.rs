//! HTML documents for PDF rendering

use crate::models::{CaseRecord, CauseList};

const STYLE: &str = "body{font-family:Arial,Helvetica,sans-serif;font-size:11px;margin:24px}\
h1{font-size:18px;margin:0 0 4px}\
h2{font-size:13px;margin:18px 0 6px;padding:4px 6px;background:#eee}\
.meta{color:#444;margin-bottom:12px}\
table{width:100%;border-collapse:collapse}\
th,td{border:1px solid #999;padding:4px 6px;text-align:left;vertical-align:top}\
th{background:#f5f5f5}\
.empty{margin-top:24px;font-style:italic}";

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document for one court's cause list
///
/// Each run of records sharing a section gets its own heading and table.
pub fn cause_list_document(list: &CauseList, court_name: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>", escape(court_name)));
    body.push_str(&format!(
        "<div class=\"meta\">Cause list for {} &middot; {} &middot; {} case(s)</div>",
        list.date(),
        list.case_kind(),
        list.total_cases()
    ));

    if list.is_empty() {
        body.push_str("<p class=\"empty\">No cases are listed for this date.</p>");
    }

    for (section, records) in list.sections() {
        if let Some(heading) = section {
            body.push_str(&format!("<h2>{}</h2>", escape(heading)));
        }
        body.push_str(&records_table(records));
    }

    document(&format!("Cause List - {}", court_name), &body)
}

/// Wrap a raw upstream fragment in a minimal UTF-8 document
pub fn wrap_fragment(fragment: &str) -> String {
    if fragment.trim_start().to_lowercase().starts_with("<!doctype") || fragment.contains("<html") {
        return fragment.to_string();
    }
    document("Cause List", fragment)
}

fn records_table(records: &[CaseRecord]) -> String {
    let mut table = String::from(
        "<table><thead><tr><th>Sr No</th><th>Case Number</th><th>Parties</th>\
         <th>Purpose</th><th>Next Hearing</th></tr></thead><tbody>",
    );
    for r in records {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&r.serial_number),
            escape(&r.case_number),
            escape(&r.parties),
            escape(&r.purpose),
            escape(r.next_hearing.as_deref().unwrap_or("")),
        ));
    }
    table.push_str("</tbody></table>");
    table
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head>\n<body>{}</body>\n</html>",
        escape(title),
        STYLE,
        body
    )
}
