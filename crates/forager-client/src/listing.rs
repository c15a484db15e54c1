use forager_core::error::AppError;
use forager_core::models::ProxyRecord;
use forager_core::traits::PageFetcher;
use scraper::{Html, Selector};

/// Public listing of free proxies, refreshed every few minutes upstream.
pub const DEFAULT_LISTING_URL: &str = "https://free-proxy-list.net/";

/// Rows near the top of the listing are the most recently verified;
/// anything deeper is usually already dead.
const MAX_ROWS: usize = 20;

/// Scrapes the proxy listing site into a pool of candidate proxies.
///
/// The listing is fetched without a proxy: there is no pool yet at this
/// point of a run, and the listing site itself is not rate limited.
pub struct ProxyPoolSource<F: PageFetcher> {
    fetcher: F,
    listing_url: String,
}

impl<F: PageFetcher> ProxyPoolSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            listing_url: DEFAULT_LISTING_URL.to_string(),
        }
    }

    pub fn with_listing_url(mut self, url: &str) -> Self {
        self.listing_url = url.to_string();
        self
    }

    /// Download and parse the listing into at most [`MAX_ROWS`] proxies.
    ///
    /// Only a fetch failure is an error. A listing that parses to zero
    /// rows comes back as an empty pool; callers may still have other
    /// proxy sources to merge in before deciding the run is unworkable.
    pub async fn fetch_pool(&self) -> Result<Vec<ProxyRecord>, AppError> {
        let html = self
            .fetcher
            .fetch(&self.listing_url, None)
            .await
            .map_err(|e| AppError::ProxyPool(format!("{}: {e}", self.listing_url)))?;

        let pool = parse_listing(&html);
        tracing::info!(count = pool.len(), url = %self.listing_url, "Fetched proxy pool");
        Ok(pool)
    }
}

/// Parse the listing table. Malformed rows are skipped, not fatal.
pub fn parse_listing(html: &str) -> Vec<ProxyRecord> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table.table.table-striped tbody tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut pool = Vec::new();
    for row in document.select(&row_selector).take(MAX_ROWS) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();

        let [ip, port, code, country, anonymity, _google, https, checked, ..] = cells.as_slice()
        else {
            tracing::debug!(cells = cells.len(), "Skipping short listing row");
            continue;
        };
        if ip.is_empty() || port.parse::<u16>().is_err() {
            tracing::debug!(%ip, %port, "Skipping malformed listing row");
            continue;
        }

        pool.push(ProxyRecord {
            address: format!("{ip}:{port}"),
            country_code: code.clone(),
            country: country.clone(),
            anonymity: anonymity.clone(),
            supports_https: https.eq_ignore_ascii_case("yes"),
            last_checked: checked.clone(),
        });
    }
    pool
}
