//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! transport produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request-duration histogram)
//!     → tracing.rs (one client span per request)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing (OTLP collector, optional)
//! ```
//!
//! # Design Decisions
//! - Registry and tracer are injected; nothing here reaches for globals
//!   except the optional process-wide installers
//! - Metric labels are bounded (HTTP method × status code)

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use metrics::gcs_request_duration;
pub use tracing::{OtelTracer, Span, TraceExtractionError, Tracer};
