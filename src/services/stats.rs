//! Purpose statistics - business capability layer

use crate::models::{CaseRecord, CauseList, CauseListStats, StatsSummary};

const UNKNOWN: &str = "Unknown";

/// Count cases per purpose
///
/// Exact-match grouping; an empty purpose counts as `Unknown`. The counts
/// always sum to `cases.len()`. No ordering is applied here.
pub fn summarize(cases: &[CaseRecord]) -> StatsSummary {
    let mut summary = StatsSummary::new();
    for case in cases {
        let purpose = case.purpose.trim();
        summary.increment(if purpose.is_empty() { UNKNOWN } else { purpose });
    }
    summary
}

/// Count cases per case type (leading token of the case number)
pub fn summarize_case_types(cases: &[CaseRecord]) -> StatsSummary {
    let mut summary = StatsSummary::new();
    for case in cases {
        summary.increment(case_type_of(&case.case_number));
    }
    summary
}

/// `O.S./12/2020` → `O.S.`, `CRL.P. 5/2025` → `CRL.P.`
pub fn case_type_of(case_number: &str) -> String {
    let head = case_number.split('/').next().unwrap_or_default();
    let token = head
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches('-');
    if token.is_empty() || token.chars().all(|c| c.is_ascii_digit()) {
        UNKNOWN.to_string()
    } else {
        token.to_string()
    }
}

/// Full stats payload for one fetched cause list
pub fn cause_list_stats(list: &CauseList, court_code: &str) -> CauseListStats {
    CauseListStats {
        total_cases: list.total_cases(),
        date: list.date().to_string(),
        court_code: court_code.to_string(),
        purposes: summarize(list.cases()),
        case_types: summarize_case_types(list.cases()),
    }
}
