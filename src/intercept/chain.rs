//! Ordered interceptor registry applied to every proxied request.

use std::sync::Arc;

use crate::config::{ConfigError, ProxyConfig};
use crate::intercept::mock_redirect::MockRedirect;
use crate::intercept::request::InterceptedRequest;
use crate::intercept::RequestInterceptor;
use crate::observability::metrics;

/// Interceptors in registration order.
///
/// Immutable once handed to the server; reloads build a fresh chain.
#[derive(Debug, Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain. Every request passes through untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.register(Arc::new(interceptor));
        self
    }

    /// Append an interceptor. It runs after everything already registered.
    pub fn register(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        tracing::debug!(interceptor = interceptor.name(), "Interceptor registered");
        self.interceptors.push(interceptor);
    }

    /// Build the chain described by the configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let mut chain = Self::new();

        if config.mock_redirect.enabled {
            match MockRedirect::from_config(&config.mock_redirect)? {
                Some(rule) => {
                    tracing::info!(
                        target_host = rule.target_host(),
                        path_pattern = %config.mock_redirect.path_pattern,
                        "Mock redirect enabled"
                    );
                    chain.register(Arc::new(rule));
                }
                None => {
                    tracing::warn!("mock_redirect.target_host is not set, requests will pass through");
                }
            }
        }

        Ok(chain)
    }

    /// Run every interceptor against the request, in order.
    ///
    /// Returns the names of the interceptors that changed where the request goes.
    pub fn apply(&self, request: &mut InterceptedRequest) -> Vec<&str> {
        let mut rewritten_by = Vec::new();

        for interceptor in &self.interceptors {
            let before = request.target();
            interceptor.intercept(request);

            if request.target() != before {
                tracing::debug!(
                    interceptor = interceptor.name(),
                    path = %request.path,
                    from = %format!("{}://{}:{}", before.scheme, before.host, before.port),
                    to = %format!("{}://{}:{}", request.scheme, request.host, request.port),
                    "Request rewritten"
                );
                metrics::record_rewrite(interceptor.name());
                rewritten_by.push(interceptor.name());
            }
        }

        rewritten_by
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}
