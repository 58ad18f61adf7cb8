//! Mock redirect proxy.
//!
//! A forward HTTP proxy that sends requests for selected API paths to a mock
//! server instead of the real upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 PROXY                        │
//!     Client Request      │  ┌─────────┐    ┌──────────────────────┐     │
//!     ────────────────────┼─▶│  http   │───▶│  intercept chain     │     │
//!                         │  │ server  │    │  mock_redirect: path │     │
//!                         │  └────┬────┘    │  match → rewrite     │     │
//!                         │       │         │  scheme/host/port    │     │
//!                         │       │CONNECT  └──────────┬───────────┘     │
//!                         │       ▼                    ▼                 │
//!                         │  ┌─────────┐       ┌──────────────┐          │
//!                         │  │ tunnel  │       │ upstream     │──────────┼──▶ origin or mock
//!                         │  └─────────┘       │ client       │          │
//!                         │                    └──────────────┘          │
//!                         │  config (TOML + watch) · observability ·     │
//!                         │  lifecycle (startup / signals / shutdown)    │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use mock_redirect_proxy::config::{load_config_with, ConfigOverrides};
use mock_redirect_proxy::intercept::{InterceptedRequest, InterceptorChain};
use mock_redirect_proxy::lifecycle::{self, Shutdown};
use mock_redirect_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "mock-redirect-proxy")]
#[command(about = "Intercepting proxy that redirects selected API paths to a mock server", long_about = None)]
struct Cli {
    /// TOML config file. Watched for changes while serving.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Mock server host (no scheme), overrides `mock_redirect.target_host`.
    #[arg(short, long)]
    mock_host: Option<String>,

    /// Log level, overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy (default)
    Serve,
    /// Validate the configuration and print it
    Check,
    /// Show where a GET to URL would be sent
    Rewrite {
        /// Absolute URL, e.g. http://api.example.com/api/organizations/kml/search
        url: String,
    },
}

#[derive(Serialize)]
struct RewriteReport<'a> {
    request: &'a InterceptedRequest,
    rewritten_by: Vec<&'a str>,
    upstream_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        mock_host: cli.mock_host,
        log_level: cli.log_level,
    };
    let config = load_config_with(cli.config.as_deref(), &overrides)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            logging::init(&config.observability.log_level);
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                bind_address = %config.listener.bind_address,
                target_host = ?config.mock_redirect.target_host,
                "mock-redirect-proxy starting"
            );

            let shutdown = Shutdown::new();
            lifecycle::start(config, cli.config.as_deref(), overrides, &shutdown).await?;

            tracing::info!("Shutdown complete");
        }
        Commands::Check => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Rewrite { url } => {
            let chain = InterceptorChain::from_config(&config)?;
            let uri: axum::http::Uri = url.parse()?;
            let mut request = InterceptedRequest::from_uri(&axum::http::Method::GET, &uri, None)
                .ok_or("URL has no host")?;

            let rewritten_by = chain.apply(&mut request);
            let report = RewriteReport {
                upstream_url: request.upstream_url(),
                request: &request,
                rewritten_by,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
