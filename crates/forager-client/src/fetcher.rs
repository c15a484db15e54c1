use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use forager_core::error::AppError;
use forager_core::models::ProxyEndpoint;
use forager_core::traits::PageFetcher;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

/// Browser-like User-Agent. GitHub serves a reduced page to unknown agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP fetcher using reqwest.
///
/// Keeps one direct client for proxyless requests and builds a proxied
/// client per endpoint on first use. Clients are cached by endpoint URL
/// so retry loops that redraw the same proxy reuse its connection pool.
#[derive(Clone)]
pub struct ReqwestFetcher {
    direct: Client,
    proxied: Arc<Mutex<HashMap<String, Client>>>,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            direct: build_client(timeout, None)?,
            proxied: Arc::new(Mutex::new(HashMap::new())),
            timeout,
        })
    }

    /// Return the cached client for an endpoint, building it on first use.
    fn client_for(&self, proxy: Option<&ProxyEndpoint>) -> Result<Client, AppError> {
        let Some(endpoint) = proxy else {
            return Ok(self.direct.clone());
        };

        let key = endpoint.url();
        let mut cache = self
            .proxied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = cache.get(&key) {
            return Ok(client.clone());
        }

        let client = build_client(self.timeout, Some(endpoint))?;
        cache.insert(key, client.clone());
        Ok(client)
    }
}

fn build_client(timeout: Duration, proxy: Option<&ProxyEndpoint>) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,*/*;q=0.8"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en,uk;q=0.9"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

    let mut builder = Client::builder().default_headers(headers).timeout(timeout);

    if let Some(endpoint) = proxy {
        let proxy = reqwest::Proxy::all(endpoint.url())
            .map_err(|e| AppError::InvalidProxy(format!("{endpoint}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| AppError::Http(e.to_string()))
}

impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, proxy: Option<&ProxyEndpoint>) -> Result<String, AppError> {
        let client = self.client_for(proxy)?;

        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout.as_secs())
            } else if e.is_connect() {
                AppError::Network(format!("Connection failed: {e}"))
            } else {
                AppError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AppError::Http(format!("Failed to read response body: {e}")))
    }
}
