use std::collections::BTreeMap;

use forager_core::error::AppError;
use forager_core::models::{DetailExtra, DetailOutcome, DetailRecord, ProxyEndpoint};
use forager_core::traits::{Enricher, PageFetcher};
use scraper::{ElementRef, Html, Selector};

use crate::search::GITHUB_BASE_URL;

/// Enriches a repository URL with owner and language breakdown.
///
/// The page is fetched through the proxy that already won the search
/// fetch. Parsing anomalies (missing or unreadable Languages section)
/// degrade to a partial record rather than failing the unit: the
/// sidebar layout changes more often than the page as a whole.
#[derive(Clone)]
pub struct DetailExtractor<F: PageFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> DetailExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: PageFetcher> Enricher for DetailExtractor<F> {
    async fn enrich(&self, url: &str, proxy: &ProxyEndpoint) -> Result<DetailOutcome, AppError> {
        let owner = derive_owner(url)?;
        let html = self.fetcher.fetch(url, Some(proxy)).await?;

        match parse_language_stats(&html) {
            Ok(stats) => Ok(DetailOutcome::Complete(DetailRecord {
                url: url.to_string(),
                extra: DetailExtra {
                    owner,
                    language_stats: Some(stats),
                },
            })),
            Err(reason) => {
                tracing::warn!(%url, %reason, "Falling back to partial detail record");
                Ok(DetailOutcome::Recovered {
                    record: DetailRecord {
                        url: url.to_string(),
                        extra: DetailExtra {
                            owner,
                            language_stats: None,
                        },
                    },
                    reason,
                })
            }
        }
    }
}

/// Owner is the first path segment of the repository URL.
fn derive_owner(url: &str) -> Result<String, AppError> {
    let path = url
        .strip_prefix(GITHUB_BASE_URL)
        .map(|p| p.trim_start_matches('/'))
        .ok_or_else(|| AppError::Parse(format!("not a repository url: {url}")))?;

    match path.split('/').next() {
        Some(owner) if !owner.is_empty() => Ok(owner.to_string()),
        _ => Err(AppError::Parse(format!("no owner segment in url: {url}"))),
    }
}

/// Parse the Languages sidebar into `name -> percent`.
///
/// The section is an `h2` titled "Languages" whose enclosing `div` holds
/// one anchor per language, each with a named span and a percentage span.
fn parse_language_stats(html: &str) -> Result<BTreeMap<String, f64>, String> {
    let document = Html::parse_document(html);
    let heading_selector = Selector::parse("h2").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();
    let span_selector = Selector::parse("span").unwrap();

    let heading = document
        .select(&heading_selector)
        .find(|h| h.text().collect::<String>().trim() == "Languages")
        .ok_or_else(|| "Languages section not found".to_string())?;

    let section = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "div")
        .ok_or_else(|| "Languages heading has no enclosing section".to_string())?;

    let mut stats = BTreeMap::new();
    for anchor in section.select(&anchor_selector) {
        let mut name: Option<String> = None;
        let mut percent: Option<f64> = None;

        for span in anchor.select(&span_selector) {
            let text = span.text().collect::<String>().trim().to_string();
            if span.value().attr("class").is_some() {
                name = Some(text);
            } else if let Ok(value) = text.trim_end_matches('%').parse::<f64>() {
                percent = Some(value);
            }
        }

        match (name, percent) {
            (Some(name), Some(pct)) if (0.0..=100.0).contains(&pct) => {
                stats.insert(name, pct);
            }
            (Some(name), Some(pct)) => {
                tracing::debug!(%name, pct, "Discarding out-of-range language entry");
            }
            _ => {}
        }
    }

    if stats.is_empty() {
        return Err("Languages section had no parsable entries".to_string());
    }
    Ok(stats)
}
