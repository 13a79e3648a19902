pub mod all_courts_flow;
pub mod court_ctx;

pub use all_courts_flow::{AllCourtsFlow, AllCourtsRequest};
pub use court_ctx::CourtCtx;
