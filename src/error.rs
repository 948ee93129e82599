//! Boundary-level error types.
//!
//! Item-level failures never appear here: they are represented as data in
//! `BatchResult` and stay inside the dispatch engine. This type covers the
//! failures that stop the process from serving at all.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("upstream channel setup failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
