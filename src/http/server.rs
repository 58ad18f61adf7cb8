//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the interceptor chain on every proxied request
//! - Forward requests to the (possibly rewritten) upstream
//! - Swap in a new interceptor chain on config reload

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ServerError};
use crate::http::request::{
    downstream_headers, has_body, is_looping, propagate_request_id_layer, proxy_via, request_id,
    set_request_id_layer, upstream_headers,
};
use crate::http::tunnel::connect_handler;
use crate::intercept::{InterceptedRequest, InterceptorChain};
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::metrics;

/// Shared, atomically replaceable interceptor chain.
pub type SharedInterceptors = Arc<ArcSwap<InterceptorChain>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub interceptors: SharedInterceptors,
    pub client: reqwest::Client,
    /// `Via` entry this instance adds to forwarded requests.
    pub via: HeaderValue,
}

/// HTTP server for the intercepting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    interceptors: SharedInterceptors,
}

impl HttpServer {
    /// Create a server with the interceptors described by the configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let chain = InterceptorChain::from_config(&config)?;
        Self::with_interceptors(config, chain)
    }

    /// Create a server with an explicitly assembled interceptor chain.
    pub fn with_interceptors(
        config: ProxyConfig,
        chain: InterceptorChain,
    ) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        let interceptors: SharedInterceptors = Arc::new(ArcSwap::from_pointee(chain));

        let state = AppState {
            interceptors: interceptors.clone(),
            client,
            via: proxy_via(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            interceptors,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        // A proxy has no routes of its own: every request, including
        // authority-form CONNECT, lands in the fallback.
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// Handle to the live interceptor chain.
    pub fn interceptors(&self) -> SharedInterceptors {
        self.interceptors.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the interceptor chain.
    /// Returns once `shutdown` fires or the process receives a termination signal.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            interceptors = self.interceptors.load().len(),
            "HTTP server starting"
        );

        let interceptors = self.interceptors.clone();
        let current_bind = self.config.listener.bind_address.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if config.listener.bind_address != current_bind {
                    tracing::warn!(
                        bind_address = %config.listener.bind_address,
                        "Listener changes require a restart, ignoring new bind address"
                    );
                }
                match InterceptorChain::from_config(&config) {
                    Ok(chain) => {
                        tracing::info!(interceptors = chain.len(), "Interceptor chain reloaded");
                        interceptors.store(Arc::new(chain));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded config, keeping current interceptors");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_requested(&mut shutdown) => {}
                    _ = wait_for_signal() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Resolves when a shutdown is broadcast. Never resolves if no one can send one.
async fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) {
    if let Err(broadcast::error::RecvError::Closed) = shutdown.recv().await {
        std::future::pending::<()>().await;
    }
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    if request.method() == Method::CONNECT {
        return connect_handler(request).await;
    }
    proxy_handler(state, request).await
}

/// Main proxy handler.
/// Runs the interceptors, then forwards the request to wherever they left it.
async fn proxy_handler(state: AppState, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();

    if is_looping(request.headers(), &state.via) {
        tracing::warn!(request_id = %request_id, uri = %request.uri(), "Request came back to this proxy");
        let err = ProxyError::LoopDetected;
        metrics::record_request(method.as_str(), err.status().as_u16(), false, start_time);
        return err.into_response();
    }

    let host_header = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());

    let Some(mut intercepted) = InterceptedRequest::from_uri(&method, request.uri(), host_header)
    else {
        tracing::warn!(request_id = %request_id, uri = %request.uri(), "Request has no target host");
        let err = ProxyError::MissingHost;
        metrics::record_request(method.as_str(), err.status().as_u16(), false, start_time);
        return err.into_response();
    };

    let rewritten = {
        let chain = state.interceptors.load();
        !chain.apply(&mut intercepted).is_empty()
    };

    let url = intercepted.upstream_url();
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %intercepted.path,
        upstream = %url,
        rewritten,
        "Proxying request"
    );

    match forward(&state.client, request, &url, &state.via).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), rewritten, start_time);
            response
        }
        Err(err) => {
            tracing::error!(request_id = %request_id, upstream = %url, error = %err, "Upstream error");
            metrics::record_request(method.as_str(), err.status().as_u16(), rewritten, start_time);
            err.into_response()
        }
    }
}

async fn forward(
    client: &reqwest::Client,
    request: Request,
    url: &str,
    via: &HeaderValue,
) -> Result<Response, ProxyError> {
    let url = reqwest::Url::parse(url).map_err(|e| ProxyError::InvalidTarget(e.to_string()))?;
    let (parts, body) = request.into_parts();

    let mut headers = upstream_headers(&parts.headers);
    headers.append(header::VIA, via.clone());

    let mut upstream = client.request(parts.method, url).headers(headers);
    if has_body(&body) {
        upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream_response = upstream.send().await?;

    let status = upstream_response.status();
    let headers = downstream_headers(upstream_response.headers());

    let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
