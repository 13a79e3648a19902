pub mod artifact_writer;
pub mod causelist;
pub mod cnr;
pub mod jurisdiction;
pub mod session;
pub mod stats;

pub use artifact_writer::ArtifactWriter;
pub use causelist::{CauseListFetcher, FetchedCauseList};
pub use cnr::CnrSearch;
pub use jurisdiction::JurisdictionResolver;
pub use session::{AuthenticatedContext, CaptchaSession, SessionManager, UpstreamSession};
pub use stats::{cause_list_stats, summarize};
