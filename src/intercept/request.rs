//! The request view handed to interceptors.

use axum::http::uri::Authority;
use axum::http::{Method, Uri};
use serde::{Serialize, Serializer};

/// An in-flight request as seen by interceptors.
///
/// Only the fields that decide where the request goes are exposed. Headers and
/// body stay with the proxy and are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterceptedRequest {
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// "http" or "https".
    pub scheme: String,
    /// Hostname or IP literal, without scheme prefix or IPv6 brackets.
    pub host: String,
    pub port: u16,
    /// Path component only.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
}

/// Where a request is sent: the triple interceptors rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl InterceptedRequest {
    /// Resolve the request target.
    ///
    /// Absolute-form URIs (`GET http://host/path`) carry their own authority.
    /// Origin-form URIs (`GET /path`) fall back to the `Host` header and are
    /// assumed to be plain HTTP. Returns `None` when no host is known.
    pub fn from_uri(method: &Method, uri: &Uri, host_header: Option<&str>) -> Option<Self> {
        let scheme = uri.scheme_str().unwrap_or("http").to_ascii_lowercase();

        let (host, explicit_port) = match uri.authority() {
            Some(authority) => (authority.host().to_string(), authority.port_u16()),
            None => {
                let authority: Authority = host_header?.trim().parse().ok()?;
                (authority.host().to_string(), authority.port_u16())
            }
        };

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }

        let port = explicit_port.unwrap_or_else(|| default_port(&scheme));
        let path = match uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Some(Self {
            method: method.clone(),
            scheme,
            host: host.to_string(),
            port,
            path,
            query: uri.query().map(str::to_string),
        })
    }

    /// Current target of the request.
    pub fn target(&self) -> Target {
        Target {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Absolute URL the request is forwarded to.
    pub fn upstream_url(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let mut url = format!("{}://{}:{}{}", self.scheme, host, self.port, self.path);
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "https" => 443,
        _ => 80,
    }
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}
