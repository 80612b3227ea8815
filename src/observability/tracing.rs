//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from request headers (W3C Trace Context)
//! - Create one client span per outbound request
//! - Record transport errors as span events
//!
//! # Design Decisions
//! - `Tracer`/`Span` are capability traits so the transport never touches a
//!   global; the OpenTelemetry-backed implementation is one choice of many
//! - Spans are finalized on drop, which covers every exit path

use opentelemetry::global::{self, BoxedSpan, BoxedTracer};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{Span as _, SpanKind, TraceContextExt, Tracer as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use reqwest::header::HeaderMap;

/// W3C trace-context header carrying the parent span identity.
const TRACEPARENT: &str = "traceparent";

/// Instrumentation scope name reported on exported spans.
const SCOPE_NAME: &str = "gcs-transport";

/// Failure to recover a parent trace context from request headers.
///
/// Callers are expected to swallow this and continue with a root span.
#[derive(Debug, thiserror::Error)]
pub enum TraceExtractionError {
    #[error("no trace context in request headers")]
    Missing,
    #[error("malformed trace context: {0}")]
    Malformed(String),
}

/// Span-creation capability handed to the transport.
pub trait Tracer: Send + Sync {
    /// Recover a parent trace context from the request's headers.
    fn extract(&self, headers: &HeaderMap) -> Result<Context, TraceExtractionError>;

    /// Start a span, optionally parented on an extracted context. The span
    /// is finalized exactly once, when the returned value is dropped.
    fn start_span(&self, name: &str, parent: Option<Context>) -> Box<dyn Span>;
}

/// A single in-flight span.
pub trait Span: Send {
    /// Attach a key/value tag.
    fn tag(&mut self, key: &'static str, value: &str);

    /// Record an error as a structured span event.
    fn record_error(&mut self, error: &(dyn std::error::Error + 'static));
}

/// `Tracer` backed by the OpenTelemetry API with W3C propagation.
pub struct OtelTracer {
    tracer: BoxedTracer,
    propagator: TraceContextPropagator,
}

impl OtelTracer {
    /// Create a tracer against the currently installed provider.
    pub fn new() -> Self {
        Self {
            tracer: global::tracer(SCOPE_NAME),
            propagator: TraceContextPropagator::new(),
        }
    }
}

impl Default for OtelTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for OtelTracer {
    fn extract(&self, headers: &HeaderMap) -> Result<Context, TraceExtractionError> {
        let raw = headers.get(TRACEPARENT).ok_or(TraceExtractionError::Missing)?;

        let context = self.propagator.extract(&HeaderCarrier(headers));
        if context.span().span_context().is_valid() {
            Ok(context)
        } else {
            Err(TraceExtractionError::Malformed(
                String::from_utf8_lossy(raw.as_bytes()).into_owned(),
            ))
        }
    }

    fn start_span(&self, name: &str, parent: Option<Context>) -> Box<dyn Span> {
        let builder = self
            .tracer
            .span_builder(name.to_string())
            .with_kind(SpanKind::Client);

        let inner = match parent {
            Some(parent_cx) => builder.start_with_context(&self.tracer, &parent_cx),
            None => builder.start(&self.tracer),
        };

        Box::new(OtelSpan { inner })
    }
}

struct OtelSpan {
    inner: BoxedSpan,
}

impl Span for OtelSpan {
    fn tag(&mut self, key: &'static str, value: &str) {
        self.inner.set_attribute(KeyValue::new(key, value.to_string()));
    }

    fn record_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.inner.record_error(error);
    }
}

impl Drop for OtelSpan {
    fn drop(&mut self) {
        self.inner.end();
    }
}

/// Read-only view of request headers for the propagator.
struct HeaderCarrier<'a>(&'a HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

/// Install the process-wide tracer provider.
///
/// With an OTLP endpoint spans are exported over gRPC in batches; without
/// one a provider with no exporter is installed and spans are dropped.
pub fn init_tracer(otlp_endpoint: Option<&str>) {
    use opentelemetry_otlp::WithExportConfig;

    if let Some(endpoint) = otlp_endpoint {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint)
            .with_protocol(opentelemetry_otlp::Protocol::Grpc);

        let config = opentelemetry_sdk::trace::Config::default().with_resource(
            opentelemetry_sdk::Resource::new(vec![KeyValue::new("service.name", SCOPE_NAME)]),
        );

        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(config)
            .install_batch(opentelemetry_sdk::runtime::Tokio)
        {
            Ok(provider) => {
                global::set_tracer_provider(provider);
                tracing::info!(endpoint, "OTLP span exporter configured");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create OTLP exporter, spans will be dropped");
                global::set_tracer_provider(opentelemetry_sdk::trace::TracerProvider::builder().build());
            }
        }
    } else {
        global::set_tracer_provider(opentelemetry_sdk::trace::TracerProvider::builder().build());
    }
}
