pub mod error;
pub mod fanout;
pub mod models;
pub mod retry;
pub mod schema;
pub mod select;
pub mod testutil;
pub mod traits;

pub use error::AppError;
pub use fanout::{FanOutCoordinator, FanOutReport};
pub use models::{
    DetailOutcome, DetailRecord, FetchOutcome, ProxyEndpoint, ProxyRecord, ProxyScheme,
    SearchInput,
};
pub use retry::{ResilientFetcher, RetryConfig};
pub use select::ProxySelector;
pub use traits::{Enricher, PageFetcher};
