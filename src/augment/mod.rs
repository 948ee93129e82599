//! Response augmentation subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied upstream response
//!     → envelope.rs (snapshot status + headers, pre-mutation)
//!     → strategy.rs (append | decode | transform the body with the
//!       JSON-encoded snapshot as trailer, fix framing headers)
//!     → boundary layer may now override the outer status; the embedded
//!       envelope still carries the true upstream values
//! ```

pub mod envelope;
pub mod strategy;

pub use envelope::ResponseEnvelope;
pub use strategy::{augment_body, AugmentError, AugmentMode};
