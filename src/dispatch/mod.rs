//! Batch dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Validated batch payload
//!     → dispatcher.rs (worker pool over a shared atomic cursor)
//!     → per item: executor.rs (validate, forward, map outcome)
//!     → on retryable status: resilience::backoff decides delay, re-execute
//!     → results assembled at original input index
//! ```

pub mod dispatcher;
pub mod executor;
pub mod types;

pub use dispatcher::dispatch;
pub use types::{BatchItem, BatchResult, UNKNOWN_REQUEST_ID};
