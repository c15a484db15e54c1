use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::error::AppError;
use crate::models::{ProxyEndpoint, ProxyRecord, ProxyScheme};

/// Exact shape an override proxy string must have.
static OVERRIDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(http|https)://(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d{1,5})$")
        .expect("Invalid override proxy regex")
});

impl ProxyEndpoint {
    /// Parse an operator-supplied override string (`scheme://ip:port`).
    ///
    /// Any other shape is rejected before any network activity occurs.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let caps = OVERRIDE_RE
            .captures(raw.trim())
            .ok_or_else(|| AppError::InvalidProxy(raw.to_string()))?;
        let scheme = match &caps[1] {
            "https" => ProxyScheme::Https,
            _ => ProxyScheme::Http,
        };
        Ok(ProxyEndpoint::new(scheme, &caps[2]))
    }
}

/// Picks one candidate endpoint per fetch attempt.
///
/// Selection is uniformly random: it avoids starving any proxy and avoids
/// per-proxy health state. The retry loop compensates for bad draws. The
/// random source is injected so tests can seed it.
pub struct ProxySelector {
    rng: StdRng,
}

impl ProxySelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Selector with a fixed seed, for deterministic tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw one endpoint from the pool.
    ///
    /// # Panics
    /// Panics if `pool` is empty. Callers must not reach selection without
    /// a pool; that is a programming error rather than a runtime condition.
    pub fn choose(&mut self, pool: &[ProxyRecord]) -> ProxyEndpoint {
        assert!(!pool.is_empty(), "proxy pool must not be empty");
        let idx = self.rng.gen_range(0..pool.len());
        pool[idx].endpoint()
    }
}

impl Default for ProxySelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_test_pool;

    #[test]
    fn test_parse_override_http() {
        let endpoint = ProxyEndpoint::parse("http://8.8.8.8:80").unwrap();
        assert_eq!(endpoint.scheme, ProxyScheme::Http);
        assert_eq!(endpoint.url(), "http://8.8.8.8:80");
    }

    #[test]
    fn test_parse_override_https() {
        let endpoint = ProxyEndpoint::parse("https://1.2.3.4:3128").unwrap();
        assert_eq!(endpoint.scheme, ProxyScheme::Https);
        assert_eq!(endpoint.url(), "https://1.2.3.4:3128");
    }

    #[test]
    fn test_parse_override_rejects_bad_shapes() {
        for raw in [
            "socks5://1.2.3.4:1080",
            "http://proxy.example.com:80",
            "http://1.2.3.4",
            "1.2.3.4:80",
            "http://1.2.3.4:80/path",
            "",
        ] {
            let err = ProxyEndpoint::parse(raw).unwrap_err();
            assert!(matches!(err, AppError::InvalidProxy(_)), "accepted: {raw}");
        }
    }

    #[test]
    fn test_choose_is_deterministic_under_seed() {
        let pool = make_test_pool(10);
        let mut a = ProxySelector::with_seed(42);
        let mut b = ProxySelector::with_seed(42);

        for _ in 0..20 {
            assert_eq!(a.choose(&pool), b.choose(&pool));
        }
    }

    #[test]
    fn test_choose_draws_from_pool() {
        let pool = make_test_pool(4);
        let mut selector = ProxySelector::with_seed(7);

        for _ in 0..50 {
            let endpoint = selector.choose(&pool);
            assert!(pool.iter().any(|p| p.endpoint() == endpoint));
        }
    }

    #[test]
    fn test_choose_eventually_visits_every_proxy() {
        let pool = make_test_pool(3);
        let mut selector = ProxySelector::with_seed(1);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..100 {
            seen.insert(selector.choose(&pool).address);
        }
        assert_eq!(seen.len(), pool.len());
    }

    #[test]
    #[should_panic(expected = "proxy pool must not be empty")]
    fn test_choose_empty_pool_panics() {
        ProxySelector::with_seed(0).choose(&[]);
    }
}
