//! Instrumented HTTP transport for Google Cloud Storage backends.
//!
//! # Architecture Overview
//!
//! ```text
//!  storage client ──▶ InstrumentedTransport ──▶ GcsTransport ──▶ GCS
//!                          │        │
//!                          │        └─▶ trace span per request
//!                          └─▶ latency histogram (method × status)
//! ```
//!
//! The decorator is a pure pass-through: no retries, no timeouts, no
//! request mutation. Callers see exactly the inner transport's
//! success/failure contract; the only visible side effects are emitted
//! metrics and trace data.

// Core subsystems
pub mod config;
pub mod transport;

// Cross-cutting concerns
pub mod observability;

pub use config::TransportConfig;
pub use observability::tracing::{OtelTracer, Span, Tracer};
pub use transport::{
    ClientOptions, ConfigurationError, Transport, TransportError, TransportFactory,
};
