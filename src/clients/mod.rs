pub mod classify;
pub mod ecourts_client;
pub mod response;

pub use classify::{classify, Verdict};
pub use ecourts_client::EcourtsClient;
pub use response::UpstreamResponse;
