//! HTTP intercepting proxy that redirects selected API paths to a mock server.

pub mod config;
pub mod error;
pub mod http;
pub mod intercept;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use intercept::{InterceptedRequest, InterceptorChain, MockRedirect, RequestInterceptor};
pub use lifecycle::Shutdown;
