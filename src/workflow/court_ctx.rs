//! Per-court context
//!
//! Which court of the complex is being processed right now.

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct CourtCtx {
    /// 1-based position in the complex's court list
    pub serial: usize,

    /// Number of courts in the run (log display only)
    pub total: usize,

    pub court_code: String,

    pub court_name: String,
}

impl CourtCtx {
    pub fn new(serial: usize, total: usize, court_code: String, court_name: String) -> Self {
        Self {
            serial,
            total,
            court_code,
            court_name,
        }
    }
}

impl Display for CourtCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[court {}/{} {} {}]",
            self.serial, self.total, self.court_code, self.court_name
        )
    }
}
