use std::future::Future;

use crate::error::AppError;
use crate::models::{DetailOutcome, ProxyEndpoint};

/// Fetches the raw body of a URL, optionally through a proxy endpoint.
///
/// Implementations own the HTTP client configuration; callers only decide
/// the target and the relay.
pub trait PageFetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        url: &str,
        proxy: Option<&ProxyEndpoint>,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns one detail-page address into a structured record, fetching it
/// through the given (already validated) proxy endpoint.
///
/// Markup anomalies are recovered into [`DetailOutcome::Recovered`];
/// only fetch failures surface as errors.
pub trait Enricher: Send + Sync + Clone {
    fn enrich(
        &self,
        url: &str,
        proxy: &ProxyEndpoint,
    ) -> impl Future<Output = Result<DetailOutcome, AppError>> + Send;
}
