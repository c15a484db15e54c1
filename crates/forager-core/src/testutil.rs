//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{DetailExtra, DetailOutcome, DetailRecord, ProxyEndpoint, ProxyRecord};
use crate::traits::{Enricher, PageFetcher};

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns scripted responses and records every call.
#[derive(Clone)]
pub struct MockPageFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// Every `(url, proxy)` pair this fetcher was asked for, in call order.
    pub calls: Arc<Mutex<Vec<(String, Option<ProxyEndpoint>)>>>,
}

impl MockPageFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str, proxy: Option<&ProxyEndpoint>) -> Result<String, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), proxy.cloned()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockEnricher
// ---------------------------------------------------------------------------

/// Mock enricher: completes every address unless told otherwise per URL.
#[derive(Clone, Default)]
pub struct MockEnricher {
    recoveries: Arc<Mutex<HashMap<String, String>>>,
    failures: Arc<Mutex<HashMap<String, AppError>>>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one URL fail with the given error (consumed on first call).
    pub fn failing(self, url: &str, error: AppError) -> Self {
        self.failures.lock().unwrap().insert(url.to_string(), error);
        self
    }

    /// Make one URL recover with partial data and the given reason.
    pub fn recovering(self, url: &str, reason: &str) -> Self {
        self.recoveries
            .lock()
            .unwrap()
            .insert(url.to_string(), reason.to_string());
        self
    }
}

impl Enricher for MockEnricher {
    async fn enrich(&self, url: &str, _proxy: &ProxyEndpoint) -> Result<DetailOutcome, AppError> {
        if let Some(error) = self.failures.lock().unwrap().remove(url) {
            return Err(error);
        }
        if let Some(reason) = self.recoveries.lock().unwrap().get(url).cloned() {
            return Ok(DetailOutcome::Recovered {
                record: make_test_record(url),
                reason,
            });
        }
        Ok(DetailOutcome::Complete(make_test_record(url)))
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a dummy DetailRecord for a URL.
pub fn make_test_record(url: &str) -> DetailRecord {
    DetailRecord {
        url: url.to_string(),
        extra: DetailExtra {
            owner: "owner".to_string(),
            language_stats: None,
        },
    }
}

/// Create a pool of `n` proxies in the TEST-NET range, alternating
/// https support.
pub fn make_test_pool(n: usize) -> Vec<ProxyRecord> {
    (0..n)
        .map(|i| ProxyRecord {
            address: format!("192.0.2.{i}:8080"),
            country_code: "US".to_string(),
            country: "United States".to_string(),
            anonymity: "anonymous".to_string(),
            supports_https: i % 2 == 0,
            last_checked: "1 min ago".to_string(),
        })
        .collect()
}
