//! The instrumented transport decorator.
//!
//! Wraps an inner [`Transport`] and, per call:
//! - measures elapsed time and records it into the request-duration
//!   histogram labeled by (HTTP method, status code) on success,
//! - opens one trace span named "`gcs <METHOD>`", tagged with the full
//!   request URL, parented on an extracted context when one is present,
//! - records a delegate error as a span event instead of an observation.
//!
//! The response and error flow back exactly as received.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use prometheus::HistogramVec;
use reqwest::{Request, Response};

use crate::observability::tracing::Tracer;
use crate::transport::{Transport, TransportError};

/// Span-name prefix identifying the storage backend.
pub const SPAN_PREFIX: &str = "gcs";

/// Transparent decorator adding latency measurement and span propagation
/// to an inner transport.
pub struct InstrumentedTransport<T> {
    duration: HistogramVec,
    tracer: Arc<dyn Tracer>,
    inner: T,
}

impl<T> InstrumentedTransport<T> {
    pub fn new(inner: T, duration: HistogramVec, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            duration,
            tracer,
            inner,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for InstrumentedTransport<T> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let start = Instant::now();
        let method = request.method().clone();

        // A missing or malformed parent context degrades to a root span,
        // never to a failed call.
        let parent = self.tracer.extract(request.headers()).ok();

        // The span is finalized when dropped, on every exit path.
        let mut span = self
            .tracer
            .start_span(&format!("{SPAN_PREFIX} {method}"), parent);
        span.tag("url", request.url().as_str());

        let result = self.inner.execute(request).await;
        match &result {
            Ok(response) => {
                self.duration
                    .with_label_values(&[method.as_str(), response.status().as_str()])
                    .observe(start.elapsed().as_secs_f64());
            }
            Err(error) => span.record_error(error),
        }
        result
    }
}
