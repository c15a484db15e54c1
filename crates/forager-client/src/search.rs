use forager_core::error::AppError;
use scraper::{Html, Selector};

pub const GITHUB_BASE_URL: &str = "https://github.com";

/// Build a GitHub search URL from keywords and a result type.
///
/// Keywords are joined with `+` the way the search form does it; the
/// type is lowercased (`Repositories` and `repositories` search the
/// same index).
pub fn build_search_url(keywords: &[String], kind: &str) -> String {
    format!(
        "{GITHUB_BASE_URL}/search?q={}&type={}",
        keywords.join("+"),
        kind.to_lowercase()
    )
}

/// Pull repository links out of a search results page.
///
/// A page without the results container means GitHub served something
/// other than results (rate-limit interstitial, login wall) and is an
/// error; a present but empty container is a legitimate zero-hit search.
pub fn parse_results(html: &str) -> Result<Vec<String>, AppError> {
    let document = Html::parse_document(html);
    let container_selector = Selector::parse(r#"div[data-testid="results-list"]"#).unwrap();
    let heading_selector = Selector::parse("h3").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let Some(container) = document.select(&container_selector).next() else {
        return Err(AppError::Parse(
            "search page has no results list".to_string(),
        ));
    };

    let mut urls = Vec::new();
    for heading in container.select(&heading_selector) {
        let Some(anchor) = heading.select(&anchor_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.starts_with('/') {
            urls.push(format!("{GITHUB_BASE_URL}{href}"));
        } else {
            urls.push(href.to_string());
        }
    }

    tracing::debug!(count = urls.len(), "Parsed search results");
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_page(entries: &[&str]) -> String {
        let items: String = entries
            .iter()
            .map(|href| format!("<div><h3><a href=\"{href}\">repo</a></h3></div>"))
            .collect();
        format!(
            "<html><body><div data-testid=\"results-list\">{items}</div></body></html>"
        )
    }

    #[test]
    fn test_build_search_url_joins_keywords() {
        let keywords = vec!["openstack".to_string(), "nova".to_string()];
        assert_eq!(
            build_search_url(&keywords, "Repositories"),
            "https://github.com/search?q=openstack+nova&type=repositories"
        );
    }

    #[test]
    fn test_parse_results_resolves_relative_links() {
        let html = results_page(&["/rust-lang/rust", "https://github.com/tokio-rs/tokio"]);

        let urls = parse_results(&html).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://github.com/rust-lang/rust",
                "https://github.com/tokio-rs/tokio"
            ]
        );
    }

    #[test]
    fn test_parse_results_empty_container_is_zero_hits() {
        let urls = parse_results(&results_page(&[])).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_parse_results_missing_container_is_an_error() {
        let err = parse_results("<html><body><h1>Rate limited</h1></body></html>").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_parse_results_skips_headings_without_links() {
        let html = "<html><body><div data-testid=\"results-list\">\
             <h3>no link here</h3>\
             <h3><a href=\"/a/b\">ok</a></h3>\
             </div></body></html>";

        let urls = parse_results(html).unwrap();
        assert_eq!(urls, vec!["https://github.com/a/b"]);
    }
}
