//! # eCourts Scraper
//!
//! Cause-list and case-status scraper for the Indian district-court portal,
//! exposed as a small REST service.
//!
//! ## Architecture
//!
//! ### ① Upstream access (Clients / Parsing)
//! - `clients/` - HTTP client with a cookie jar, reply classification
//! - `parsing/` - HTML readers: option lists, cause-list tables, case details
//!
//! ### ② Business capabilities (Services)
//! - `services/` - each answers "what can I do" for a single request
//! - `SessionManager` - upstream session, anti-forgery token and captcha lifecycle
//! - `JurisdictionResolver` - state → district → complex → court listings
//! - `CauseListFetcher` - one court's cause list for one date
//! - `CnrSearch` - CNR and case-number lookups
//!
//! ### ③ Rendering
//! - `render/` - HTML documents, PDF engines with fallback, ZIP archives
//!
//! ### ④ Workflow
//! - `workflow/` - multi-step flows: every court of a complex under one captcha
//!
//! ### ⑤ Outer surface
//! - `api/` - REST routes and the JSON envelope
//! - `app` - listener and server loop

pub mod api;
pub mod app;
pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod render;
pub mod services;
pub mod utils;
pub mod workflow;

pub use api::{router, AppState};
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{CaseKind, CaseRecord, CauseList, CauseListQuery, CnrRecord, CourtCode, JurisdictionNode, WireDate};
pub use render::DocumentRenderer;
pub use services::{CauseListFetcher, CnrSearch, JurisdictionResolver, SessionManager};
pub use workflow::{AllCourtsFlow, AllCourtsRequest};
