//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the access log line of every request
//! - Metric helpers are free functions; without an installed recorder they are no-ops
//! - Breaker transitions are logged and counted by the store, not the breaker

pub mod logging;
pub mod metrics;
