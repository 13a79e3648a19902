use serde::{Deserialize, Serialize};

/// Result of a CNR or case-number lookup
///
/// `serial_number` is only ever set when the case is listed today or tomorrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnrRecord {
    pub case_number: String,
    pub case_type: Option<String>,
    pub filing_date: Option<String>,
    pub petitioner: Option<String>,
    pub respondent: Option<String>,
    pub court_name: Option<String>,
    pub judge_name: Option<String>,
    pub next_hearing: Option<String>,
    pub status: Option<String>,
    pub is_listed_today: bool,
    pub is_listed_tomorrow: bool,
    pub serial_number: Option<String>,
}

impl CnrRecord {
    pub fn is_listed(&self) -> bool {
        self.is_listed_today || self.is_listed_tomorrow
    }
}

/// Case-number search parameters (type, number, registration year)
#[derive(Debug, Clone, Deserialize)]
pub struct CaseNumberQuery {
    pub state_code: String,
    pub dist_code: String,
    #[serde(alias = "complex_code")]
    pub court_complex_code: String,
    #[serde(default = "default_est_code")]
    pub est_code: String,
    pub case_type: String,
    pub case_number: String,
    pub year: String,
}

fn default_est_code() -> String {
    "null".to_string()
}
