//! CONNECT tunnelling.
//!
//! Tunnelled bytes are relayed as-is. TLS inside the tunnel is never
//! terminated, so interceptors do not see these requests.

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::error::ProxyError;
use crate::http::request::request_id;
use crate::observability::metrics;

/// Accept a CONNECT request and relay the upgraded connection in the background.
pub async fn connect_handler(req: Request) -> Response {
    let request_id = request_id(req.headers()).to_string();

    let Some(addr) = req.uri().authority().map(|auth| auth.to_string()) else {
        tracing::warn!(request_id = %request_id, uri = %req.uri(), "CONNECT without authority");
        return ProxyError::InvalidTarget(req.uri().to_string()).into_response();
    };

    tracing::debug!(request_id = %request_id, target = %addr, "Opening tunnel");

    tokio::spawn(async move {
        match hyper::upgrade::on(req).await {
            Ok(upgraded) => match tunnel(upgraded, &addr).await {
                Ok((from_client, from_server)) => {
                    metrics::record_tunnel("closed");
                    tracing::debug!(
                        request_id = %request_id,
                        target = %addr,
                        from_client,
                        from_server,
                        "Tunnel closed"
                    );
                }
                Err(e) => {
                    metrics::record_tunnel("error");
                    tracing::warn!(request_id = %request_id, target = %addr, error = %e, "Tunnel failed");
                }
            },
            Err(e) => {
                metrics::record_tunnel("upgrade_failed");
                tracing::warn!(request_id = %request_id, error = %e, "Upgrade failed");
            }
        }
    });

    (StatusCode::OK, Body::empty()).into_response()
}

async fn tunnel(upgraded: Upgraded, addr: &str) -> std::io::Result<(u64, u64)> {
    let mut server = TcpStream::connect(addr).await?;
    let mut upgraded = TokioIo::new(upgraded);
    tokio::io::copy_bidirectional(&mut upgraded, &mut server).await
}
