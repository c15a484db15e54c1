use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::error::AppError;
use crate::models::{FetchOutcome, ProxyEndpoint, ProxyRecord};
use crate::select::ProxySelector;
use crate::traits::PageFetcher;

/// Upper bound on the random jitter added to each backoff delay.
const JITTER_MS: u64 = 500;

/// Retry policy for fetching through unreliable proxies.
///
/// Delays grow exponentially from `backoff` and are capped at `max_backoff`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Calculate the base delay after a given attempt (0-indexed).
    ///
    /// - After attempt 0: 2s
    /// - After attempt 1: 4s
    /// - After attempt 2: 8s
    /// - ... capped at `max_backoff`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        std::cmp::min(self.backoff.saturating_mul(factor), self.max_backoff)
    }
}

/// Fetches a target through rotating proxies, retrying with backoff.
///
/// Each attempt draws a fresh endpoint from the pool (unless an override
/// pins one), so a dead proxy costs one attempt, not the run. Attempts are
/// strictly sequential: flooding a broken path helps nobody.
pub struct ResilientFetcher<F: PageFetcher> {
    fetcher: F,
    selector: ProxySelector,
    config: RetryConfig,
}

impl<F: PageFetcher> ResilientFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            selector: ProxySelector::new(),
            config: RetryConfig::default(),
        }
    }

    pub fn with_selector(mut self, selector: ProxySelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch `target`, redrawing a proxy per attempt.
    ///
    /// Returns `Ok(Success)` with the winning endpoint on the first attempt
    /// that succeeds, `Ok(Exhausted)` once all attempts fail with transient
    /// errors, and `Err` for conditions retrying cannot fix (malformed
    /// target, non-retryable fetch errors).
    ///
    /// # Panics
    /// Panics if `pool` is empty and no override is given (see
    /// [`ProxySelector::choose`]).
    pub async fn fetch_with_retries(
        &mut self,
        target: &str,
        pool: &[ProxyRecord],
        override_proxy: Option<&ProxyEndpoint>,
    ) -> Result<FetchOutcome, AppError> {
        validate_target(target)?;

        let max_attempts = self.config.max_attempts;
        let mut last_error: Option<AppError> = None;

        for attempt in 0..max_attempts {
            let endpoint = match override_proxy {
                Some(pinned) => pinned.clone(),
                None => self.selector.choose(pool),
            };

            match self.fetcher.fetch(target, Some(&endpoint)).await {
                Ok(body) => {
                    tracing::info!(proxy = %endpoint, attempt = attempt + 1, "Selected proxy");
                    return Ok(FetchOutcome::Success {
                        body,
                        proxy: endpoint,
                    });
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        %target,
                        proxy = %endpoint,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts,
                        "Fetch attempt failed"
                    );
                    last_error = Some(e);
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.backoff_delay(attempt)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(FetchOutcome::Exhausted {
            attempts: max_attempts,
            last_error: last_error
                .unwrap_or_else(|| AppError::Generic("no fetch attempts were made".into())),
        })
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=JITTER_MS);
        self.config.delay_for_attempt(attempt) + Duration::from_millis(jitter)
    }
}

/// Validate the target URL before burning any attempts on it.
/// A malformed target will not be fixed by retrying.
fn validate_target(target: &str) -> Result<(), AppError> {
    let parsed = Url::parse(target).map_err(|e| AppError::InvalidTarget {
        url: target.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::InvalidTarget {
            url: target.to_string(),
            reason: format!("scheme '{scheme}' is not allowed (only http/https)"),
        }),
    }
}
