use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One row of the free-proxy listing table.
///
/// Immutable after creation. Only `address` and `supports_https` drive
/// endpoint selection; the remaining columns are descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    /// `ip:port`
    pub address: String,
    pub country_code: String,
    pub country: String,
    pub anonymity: String,
    pub supports_https: bool,
    pub last_checked: String,
}

impl ProxyRecord {
    /// Build a bare record from an `ip:port` address, e.g. for addresses
    /// supplied in the input file. Https support is assumed absent.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            country_code: String::new(),
            country: String::new(),
            anonymity: String::new(),
            supports_https: false,
            last_checked: String::new(),
        }
    }

    /// Derive the dial target for this record.
    ///
    /// The scheme reflects the proxy's declared https capability, not the
    /// scheme of any target URL.
    pub fn endpoint(&self) -> ProxyEndpoint {
        let scheme = if self.supports_https {
            ProxyScheme::Https
        } else {
            ProxyScheme::Http
        };
        ProxyEndpoint::new(scheme, self.address.clone())
    }
}

/// Scheme of a proxy dial target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    Http,
    Https,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved proxy dial target for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub scheme: ProxyScheme,
    /// `ip:port`
    pub address: String,
}

impl ProxyEndpoint {
    pub fn new(scheme: ProxyScheme, address: impl Into<String>) -> Self {
        Self {
            scheme,
            address: address.into(),
        }
    }

    /// Full dial URL, `scheme://ip:port`.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.address)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Terminal value of one resilient fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A proxy produced a successful response. The endpoint is returned so
    /// downstream fan-out can reuse it instead of re-running discovery.
    Success {
        body: String,
        proxy: ProxyEndpoint,
    },
    /// Every attempt failed. A typed "no result", not a crash: the caller
    /// decides whether to proceed with empty output.
    Exhausted {
        attempts: u32,
        last_error: AppError,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn into_success(self) -> Option<(String, ProxyEndpoint)> {
        match self {
            FetchOutcome::Success { body, proxy } => Some((body, proxy)),
            FetchOutcome::Exhausted { .. } => None,
        }
    }
}

/// Structured metadata scraped from one repository detail page.
///
/// Serializes as `{"url": ..., "extra": {"owner": ..., "language_stats": ...}}`
/// with `language_stats` omitted entirely when no language data was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub url: String,
    pub extra: DetailExtra,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailExtra {
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_stats: Option<BTreeMap<String, f64>>,
}

/// Result of one detail extraction, distinguishing a fully parsed record
/// from one recovered after a markup anomaly (e.g. a repository without a
/// Languages section).
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    Complete(DetailRecord),
    Recovered { record: DetailRecord, reason: String },
}

impl DetailOutcome {
    pub fn record(self) -> DetailRecord {
        match self {
            DetailOutcome::Complete(record) => record,
            DetailOutcome::Recovered { record, .. } => record,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, DetailOutcome::Recovered { .. })
    }
}

/// The operator-supplied search request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    pub keywords: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Extra `ip:port` addresses appended to the fetched pool.
    #[serde(default)]
    pub proxies: Vec<String>,
}

impl SearchInput {
    /// Default output filename stem: keywords joined by `_`.
    pub fn default_output_name(&self) -> String {
        self.keywords.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_scheme_follows_https_support() {
        let https_proxy = ProxyRecord {
            address: "8.8.8.8:80".into(),
            country_code: "US".into(),
            country: "United States".into(),
            anonymity: "anonymous".into(),
            supports_https: true,
            last_checked: "5 secs ago".into(),
        };
        let plain_proxy = ProxyRecord {
            supports_https: false,
            address: "8.8.4.4:80".into(),
            ..https_proxy.clone()
        };

        assert_eq!(https_proxy.endpoint().url(), "https://8.8.8.8:80");
        assert_eq!(plain_proxy.endpoint().url(), "http://8.8.4.4:80");
    }

    #[test]
    fn test_record_from_address_dials_plain_http() {
        let record = ProxyRecord::from_address("1.2.3.4:3128");
        assert_eq!(record.endpoint().url(), "http://1.2.3.4:3128");
    }

    #[test]
    fn test_detail_record_serialization_shape() {
        let mut stats = BTreeMap::new();
        stats.insert("Python".to_string(), 98.0);
        stats.insert("HTML".to_string(), 1.1);

        let record = DetailRecord {
            url: "https://github.com/owner/repo".into(),
            extra: DetailExtra {
                owner: "owner".into(),
                language_stats: Some(stats),
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["url"], "https://github.com/owner/repo");
        assert_eq!(json["extra"]["owner"], "owner");
        assert_eq!(json["extra"]["language_stats"]["Python"], 98.0);
    }

    #[test]
    fn test_language_stats_omitted_when_absent() {
        let record = DetailRecord {
            url: "https://github.com/owner/repo".into(),
            extra: DetailExtra {
                owner: "owner".into(),
                language_stats: None,
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["extra"].get("language_stats").is_none());
    }

    #[test]
    fn test_search_input_deserialization() {
        let input: SearchInput = serde_json::from_str(
            r#"{"keywords": ["openstack", "nova"], "type": "Repositories", "proxies": ["1.2.3.4:8080"]}"#,
        )
        .unwrap();

        assert_eq!(input.keywords, vec!["openstack", "nova"]);
        assert_eq!(input.kind, "Repositories");
        assert_eq!(input.proxies, vec!["1.2.3.4:8080"]);
        assert_eq!(input.default_output_name(), "openstack_nova");
    }

    #[test]
    fn test_search_input_proxies_default_empty() {
        let input: SearchInput =
            serde_json::from_str(r#"{"keywords": ["css"], "type": "code"}"#).unwrap();
        assert!(input.proxies.is_empty());
    }

    #[test]
    fn test_outcome_accessors() {
        let success = FetchOutcome::Success {
            body: "ok".into(),
            proxy: ProxyEndpoint::new(ProxyScheme::Http, "8.8.8.8:80"),
        };
        assert!(success.is_success());
        let (body, proxy) = success.into_success().unwrap();
        assert_eq!(body, "ok");
        assert_eq!(proxy.url(), "http://8.8.8.8:80");

        let exhausted = FetchOutcome::Exhausted {
            attempts: 15,
            last_error: AppError::Timeout(5),
        };
        assert!(!exhausted.is_success());
        assert!(exhausted.into_success().is_none());
    }
}
