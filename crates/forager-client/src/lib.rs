//! HTTP client and HTML parsing for Forager.
//!
//! This crate owns everything that touches the network or a real page:
//! the reqwest-backed [`PageFetcher`](forager_core::PageFetcher)
//! implementation, the free-proxy listing scraper, the GitHub search
//! result parser, and the repository detail extractor.

pub mod detail;
pub mod fetcher;
pub mod listing;
pub mod search;

pub use detail::DetailExtractor;
pub use fetcher::ReqwestFetcher;
pub use listing::ProxyPoolSource;
pub use search::{build_search_url, parse_results};
