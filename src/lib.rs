//! Batch HTTP dispatch gateway.
//!
//! Accepts a batch of independent outbound sub-requests in one call,
//! forwards each through a shared upstream channel under a concurrency
//! bound, and returns every result keyed by its caller-supplied
//! identifier. An optional relay mode proxies single requests and embeds
//! an envelope trailer in the response body.

pub mod augment;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
