//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Sub-request attempt finishes:
//!     → backoff.rs (RetryPolicy: retry this status? how long to wait?)
//!     → dispatcher sleeps the computed delay, re-executes with attempt+1
//! ```
//!
//! # Design Decisions
//! - Retry only on statuses the policy names (rate-limit signals); connect
//!   errors and timeouts carry no retryable status and are surfaced as-is
//! - Delay schedule is pure and deterministic; no hidden state in closures

pub mod backoff;

pub use backoff::RetryPolicy;
