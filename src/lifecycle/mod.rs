//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup: load config → validate → init logging/metrics → bind → serve
//! Shutdown: SIGTERM/SIGINT → trigger coordinator → stop accepting →
//!           drain in-flight requests → exit
//! ```

pub mod shutdown;

pub use shutdown::{listen_for_signals, Shutdown, ShutdownListener};
