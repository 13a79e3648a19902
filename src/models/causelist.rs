use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;
use crate::models::date::WireDate;
use crate::models::jurisdiction::CourtCode;

/// Civil or criminal docket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseKind {
    #[default]
    Civil,
    Criminal,
}

impl CaseKind {
    /// Value of the upstream `cicri` form field
    pub fn wire_code(self) -> &'static str {
        match self {
            CaseKind::Civil => "civ",
            CaseKind::Criminal => "cri",
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaseKind::Civil => "Civil",
            CaseKind::Criminal => "Criminal",
        })
    }
}

impl FromStr for CaseKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "civ" | "civil" => Ok(CaseKind::Civil),
            "cri" | "crim" | "criminal" => Ok(CaseKind::Criminal),
            other => Err(AppError::invalid_request(format!(
                "unknown case type '{}': expected civ or cri",
                other
            ))),
        }
    }
}

impl Serialize for CaseKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_code())
    }
}

impl<'de> Deserialize<'de> for CaseKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One upstream cause-list request
///
/// Immutable once built; maps to exactly one submit call.
#[derive(Debug, Clone)]
pub struct CauseListQuery {
    state_code: String,
    dist_code: String,
    complex_code: String,
    court_code: CourtCode,
    date: WireDate,
    case_kind: CaseKind,
    captcha_answer: String,
    court_name: Option<String>,
}

impl CauseListQuery {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state_code: impl Into<String>,
        dist_code: impl Into<String>,
        complex_code: impl Into<String>,
        court_code: CourtCode,
        date: WireDate,
        case_kind: CaseKind,
        captcha_answer: impl Into<String>,
        court_name: Option<String>,
    ) -> Self {
        Self {
            state_code: state_code.into(),
            dist_code: dist_code.into(),
            complex_code: complex_code.into(),
            court_code,
            date,
            case_kind,
            captcha_answer: captcha_answer.into().trim().to_string(),
            court_name: court_name.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn state_code(&self) -> &str {
        &self.state_code
    }

    pub fn dist_code(&self) -> &str {
        &self.dist_code
    }

    pub fn complex_code(&self) -> &str {
        &self.complex_code
    }

    pub fn court_code(&self) -> &CourtCode {
        &self.court_code
    }

    pub fn date(&self) -> WireDate {
        self.date
    }

    pub fn case_kind(&self) -> CaseKind {
        self.case_kind
    }

    pub fn captcha_answer(&self) -> &str {
        &self.captcha_answer
    }

    pub fn court_name(&self) -> Option<&str> {
        self.court_name.as_deref()
    }
}

/// One row of a cause list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub serial_number: String,
    pub case_number: String,
    pub parties: String,
    pub purpose: String,
    /// Nearest preceding section heading (bench, category), if any
    pub section: Option<String>,
    pub next_hearing: Option<String>,
    /// Court column, present on combined listings
    #[serde(default)]
    pub court_name: Option<String>,
}

/// Parsed cause list for one court and date
///
/// `total_cases` always equals `cases.len()`; the fields are private so the
/// count cannot drift from the rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseList {
    date: WireDate,
    case_kind: CaseKind,
    cases: Vec<CaseRecord>,
    total_cases: usize,
}

impl CauseList {
    pub fn new(date: WireDate, case_kind: CaseKind, cases: Vec<CaseRecord>) -> Self {
        let total_cases = cases.len();
        Self {
            date,
            case_kind,
            cases,
            total_cases,
        }
    }

    pub fn date(&self) -> WireDate {
        self.date
    }

    pub fn case_kind(&self) -> CaseKind {
        self.case_kind
    }

    pub fn cases(&self) -> &[CaseRecord] {
        &self.cases
    }

    pub fn total_cases(&self) -> usize {
        self.total_cases
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Consecutive runs of records sharing a section, in order
    pub fn sections(&self) -> Vec<(Option<&str>, &[CaseRecord])> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=self.cases.len() {
            if i == self.cases.len() || self.cases[i].section != self.cases[start].section {
                runs.push((self.cases[start].section.as_deref(), &self.cases[start..i]));
                start = i;
            }
        }
        runs
    }
}
