use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// Functional area the upstream tracks captchas for independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptchaModule {
    /// Daily cause lists
    CauseList,
    /// Case status lookups (CNR and case-number search)
    CaseStatus,
}

impl CaptchaModule {
    pub fn wire_name(self) -> &'static str {
        match self {
            CaptchaModule::CauseList => "causelist",
            CaptchaModule::CaseStatus => "cnr",
        }
    }

    /// Upstream page a browser would be on when requesting this captcha
    pub fn referer_page(self) -> &'static str {
        match self {
            CaptchaModule::CauseList => "cause_list/index",
            CaptchaModule::CaseStatus => "casestatus/index",
        }
    }
}

impl fmt::Display for CaptchaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for CaptchaModule {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "causelist" | "cause_list" | "cause-list" => Ok(CaptchaModule::CauseList),
            "cnr" | "casestatus" | "case_status" | "case" => Ok(CaptchaModule::CaseStatus),
            other => Err(AppError::invalid_request(format!("unknown captcha module '{}'", other))),
        }
    }
}

impl Serialize for CaptchaModule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for CaptchaModule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
