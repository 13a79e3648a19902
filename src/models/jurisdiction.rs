use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Separator between establishment id and court number in a court code
pub const COURT_CODE_SEPARATOR: char = '^';

/// Level in the state → district → complex → court hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionLevel {
    State,
    District,
    Complex,
    Court,
}

impl fmt::Display for JurisdictionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JurisdictionLevel::State => "state",
            JurisdictionLevel::District => "district",
            JurisdictionLevel::Complex => "complex",
            JurisdictionLevel::Court => "court",
        };
        f.write_str(name)
    }
}

/// One entry of a hierarchy listing
///
/// Codes are opaque upstream identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionNode {
    pub code: String,
    pub name: String,
    pub level: JurisdictionLevel,
}

impl JurisdictionNode {
    pub fn new(code: impl Into<String>, name: impl Into<String>, level: JurisdictionLevel) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level,
        }
    }
}

/// Court code qualified with its establishment id, e.g. `2^7`
///
/// Only this form is accepted by the cause-list query. A bare court number
/// must be re-resolved against the live court list, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourtCode {
    raw: String,
    separator_at: usize,
}

impl CourtCode {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        let separator_at = raw.find(COURT_CODE_SEPARATOR).ok_or_else(|| {
            AppError::invalid_request(format!(
                "court code '{}' is not qualified with an establishment id",
                raw
            ))
        })?;
        let (est, court) = (&raw[..separator_at], &raw[separator_at + 1..]);
        if est.is_empty() || court.is_empty() {
            return Err(AppError::invalid_request(format!(
                "court code '{}' has an empty part",
                raw
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            separator_at,
        })
    }

    /// Whether a raw code carries the establishment separator
    pub fn is_qualified(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn establishment(&self) -> &str {
        &self.raw[..self.separator_at]
    }

    pub fn court_number(&self) -> &str {
        &self.raw[self.separator_at + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for CourtCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
