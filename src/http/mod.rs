//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! POST /batch
//!     → batch.rs (auth check, payload validation)
//!     → dispatch engine
//!     → batch.rs serializes the keyed result map
//!
//! any other request (relay mode)
//!     → relay.rs (routing header + allow-list)
//!     → upstream channel
//!     → augment subsystem embeds the envelope trailer
//! ```

pub mod batch;
pub mod relay;
pub mod server;

pub use server::{AppState, HttpServer};
