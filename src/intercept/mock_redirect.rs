//! Redirects matching requests to a mock server.

use std::sync::LazyLock;

use crate::config::{ConfigError, MockRedirectConfig, DEFAULT_PATH_PATTERN};
use crate::intercept::matcher::PathPattern;
use crate::intercept::request::InterceptedRequest;
use crate::intercept::RequestInterceptor;

static DEFAULT_PATTERN: LazyLock<PathPattern> = LazyLock::new(|| {
    PathPattern::new(DEFAULT_PATH_PATTERN).expect("default path pattern compiles")
});

/// Rewrites scheme, host and port of requests whose path matches the pattern.
///
/// The path is never touched, so routing by path is preserved against the
/// mock host. Applying the rule twice is the same as applying it once.
#[derive(Debug, Clone)]
pub struct MockRedirect {
    pattern: PathPattern,
    target_scheme: String,
    target_host: String,
    target_port: u16,
}

impl MockRedirect {
    /// Redirect `/api/organizations/kml/...` to `https://{target_host}:443`.
    pub fn new(target_host: impl Into<String>) -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
            target_scheme: "https".to_string(),
            target_host: target_host.into(),
            target_port: 443,
        }
    }

    /// Build the rule from its config section.
    ///
    /// Returns `Ok(None)` when no target host is configured.
    pub fn from_config(config: &MockRedirectConfig) -> Result<Option<Self>, ConfigError> {
        let Some(host) = config.target_host.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if host.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            pattern: PathPattern::new(&config.path_pattern)?,
            target_scheme: config.target_scheme.clone(),
            target_host: host.to_string(),
            target_port: config.target_port,
        }))
    }

    /// Returns true if requests to `path` are redirected.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }
}

impl RequestInterceptor for MockRedirect {
    fn name(&self) -> &str {
        "mock_redirect"
    }

    fn intercept(&self, request: &mut InterceptedRequest) {
        if !self.matches(&request.path) {
            return;
        }
        request.scheme = self.target_scheme.clone();
        request.host = self.target_host.clone();
        request.port = self.target_port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    const MOCK_HOST: &str = "abc123.mock.pstmn.io";

    fn request(url: &str) -> InterceptedRequest {
        let uri: Uri = url.parse().unwrap();
        InterceptedRequest::from_uri(&Method::GET, &uri, None).unwrap()
    }

    #[test]
    fn rewrites_matching_request() {
        let rule = MockRedirect::new(MOCK_HOST);
        let mut req = request("http://api.example.com:80/api/organizations/kml/search");

        rule.intercept(&mut req);

        assert_eq!(req.scheme, "https");
        assert_eq!(req.host, MOCK_HOST);
        assert_eq!(req.port, 443);
        assert_eq!(req.path, "/api/organizations/kml/search");
    }

    #[test]
    fn new_uses_default_pattern() {
        let rule = MockRedirect::new(MOCK_HOST);
        assert_eq!(rule.pattern.as_str(), DEFAULT_PATH_PATTERN);
        assert_eq!(rule.target_host(), MOCK_HOST);
    }

    #[test]
    fn rewrites_empty_suffix() {
        let rule = MockRedirect::new(MOCK_HOST);
        let mut req = request("http://api.example.com/api/organizations/kml/");

        rule.intercept(&mut req);

        assert_eq!(req.host, MOCK_HOST);
        assert_eq!(req.path, "/api/organizations/kml/");
    }

    #[test]
    fn passes_through_other_paths() {
        let rule = MockRedirect::new(MOCK_HOST);
        for url in [
            "http://api.example.com/api/organizations/other",
            "http://api.example.com/API/organizations/kml/x",
            "http://api.example.com/api/organizations/kml",
        ] {
            let mut req = request(url);
            let before = req.clone();
            rule.intercept(&mut req);
            assert_eq!(req, before, "{url} should pass through");
        }
    }

    #[test]
    fn query_does_not_affect_match() {
        let rule = MockRedirect::new(MOCK_HOST);

        let mut req = request("http://api.example.com/api/organizations/kml/search?filter=none");
        rule.intercept(&mut req);
        assert_eq!(req.host, MOCK_HOST);
        assert_eq!(req.query.as_deref(), Some("filter=none"));

        let mut req = request("http://api.example.com/other?next=/api/organizations/kml/");
        rule.intercept(&mut req);
        assert_eq!(req.host, "api.example.com");
    }

    #[test]
    fn is_idempotent() {
        let rule = MockRedirect::new(MOCK_HOST);
        let mut once = request("http://api.example.com/api/organizations/kml/search");
        rule.intercept(&mut once);

        let mut twice = once.clone();
        rule.intercept(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn from_config_honours_overrides() {
        let config = MockRedirectConfig {
            target_host: Some("127.0.0.1".into()),
            target_scheme: "http".into(),
            target_port: 18080,
            ..Default::default()
        };
        let rule = MockRedirect::from_config(&config).unwrap().unwrap();
        let mut req = request("https://api.example.com/api/organizations/kml/search");

        rule.intercept(&mut req);

        assert_eq!(req.upstream_url(), "http://127.0.0.1:18080/api/organizations/kml/search");
    }

    #[test]
    fn from_config_without_host_is_none() {
        let config = MockRedirectConfig::default();
        assert!(MockRedirect::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn from_config_rejects_bad_pattern() {
        let config = MockRedirectConfig {
            target_host: Some(MOCK_HOST.into()),
            path_pattern: "(".into(),
            ..Default::default()
        };
        assert!(matches!(
            MockRedirect::from_config(&config),
            Err(ConfigError::Pattern(_))
        ));
    }
}
