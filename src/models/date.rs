//! Wire date (`DD-MM-YYYY`)
//!
//! The upstream portal and the REST surface both speak `DD-MM-YYYY`. Callers
//! may also send ISO `YYYY-MM-DD`; it is normalised on parse.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Days, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AppError, AppResult};

/// Formats accepted from upstream free text, tried in order
const LOOSE_FORMATS: [&str; 4] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// `17th October 2025`
static SPELLED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\s*,?\s+(\d{4})").expect("spelled date pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireDate(NaiveDate);

impl WireDate {
    pub const WIRE_FORMAT: &'static str = "%d-%m-%Y";

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn tomorrow() -> Self {
        Self::today().next_day()
    }

    pub fn next_day(&self) -> Self {
        Self(self.0.checked_add_days(Days::new(1)).unwrap_or(self.0))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parse a caller-supplied date: `DD-MM-YYYY` or `YYYY-MM-DD`
    pub fn parse(input: &str) -> AppResult<Self> {
        let input = input.trim();
        NaiveDate::parse_from_str(input, Self::WIRE_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
            .map(Self)
            .map_err(|_| {
                AppError::invalid_request(format!(
                    "invalid date '{}': expected DD-MM-YYYY or YYYY-MM-DD",
                    input
                ))
            })
    }

    /// Best-effort parse of a date embedded in upstream text
    ///
    /// Accepts the numeric formats the portal uses as well as
    /// `17th October 2025`. Trailing text after the date is ignored.
    pub fn parse_loose(text: &str) -> Option<Self> {
        let text = text.trim();
        let first = text.split_whitespace().next()?;
        for fmt in LOOSE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(first, fmt) {
                return Some(Self(date));
            }
        }

        let caps = SPELLED_DATE.captures(text)?;
        let normalised = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        NaiveDate::parse_from_str(&normalised, "%d %B %Y").ok().map(Self)
    }
}

impl fmt::Display for WireDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::WIRE_FORMAT))
    }
}

impl FromStr for WireDate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for WireDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WireDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
