//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! File handlers and server produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (served / rejected counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, encoding, status) rather than formatted strings
//! - Metrics are cheap counter increments; recording without an installed
//!   exporter is a no-op

pub mod logging;
pub mod metrics;
