//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! Executor-built request
//!     → channel.rs (shared hyper client, keep-alive pool)
//!     → direct connection, or CONNECT tunnel via configured relay
//!     → upstream server
//! ```

pub mod channel;

pub use channel::UpstreamChannel;
