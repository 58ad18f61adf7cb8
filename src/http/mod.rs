//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!         CONNECT → tunnel.rs (blind byte relay)
//!         other   → request.rs (request ID, header hygiene)
//!                 → intercept chain (may rewrite scheme/host/port)
//!                 → upstream client → response streamed back
//! ```

pub mod request;
pub mod server;
pub mod tunnel;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, SharedInterceptors};
