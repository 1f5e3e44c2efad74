mod client;
mod endpoints;
pub mod metrics;
mod region;
pub mod traits;
pub mod types;

pub use client::RiotClient;
pub use region::Region;
pub use traits::MatchApi;
pub use types::{MatchDetail, RiotApiError, RiotApiResponse};
