//! Request interception subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request (method, URI, Host header)
//!     → request.rs (InterceptedRequest: scheme, host, port, path, query)
//!     → chain.rs (run registered interceptors in order)
//!         → mock_redirect.rs (matcher.rs decides, rewrite target)
//!     → proxy forwards to InterceptedRequest::upstream_url()
//! ```
//!
//! # Design Decisions
//! - Interceptors are registered explicitly on a chain passed to the server
//! - Interceptors are synchronous and hold no per-request state
//! - Interceptors change where a request goes, never its path or body

pub mod chain;
pub mod matcher;
pub mod mock_redirect;
pub mod request;

pub use chain::InterceptorChain;
pub use matcher::PathPattern;
pub use mock_redirect::MockRedirect;
pub use request::{InterceptedRequest, Target};

/// A hook run on every proxied request before it is forwarded upstream.
pub trait RequestInterceptor: Send + Sync + std::fmt::Debug {
    /// Identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// Inspect and optionally rewrite the request in place.
    fn intercept(&self, request: &mut InterceptedRequest);
}
