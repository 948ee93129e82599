//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming batch call:
//!     → auth.rs (constant-time access-key check, before any dispatch)
//!
//! Incoming relay call:
//!     → allowlist.rs (target host must be explicitly permitted)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - No trust in client input

pub mod allowlist;
pub mod auth;

pub use allowlist::HostAllowlist;
pub use auth::{bearer_token, verify_access_key};
