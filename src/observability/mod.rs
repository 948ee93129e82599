//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout/stderr log aggregation
//!     → Prometheus scrape of the metrics endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
