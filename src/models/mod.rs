pub mod captcha;
pub mod case;
pub mod causelist;
pub mod date;
pub mod jurisdiction;
pub mod stats;

pub use captcha::CaptchaModule;
pub use case::{CaseNumberQuery, CnrRecord};
pub use causelist::{CaseKind, CaseRecord, CauseList, CauseListQuery};
pub use date::WireDate;
pub use jurisdiction::{CourtCode, JurisdictionLevel, JurisdictionNode, COURT_CODE_SEPARATOR};
pub use stats::{CauseListStats, StatsSummary};
