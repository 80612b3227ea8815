//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the request-duration histogram recorded by the transport
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `storage_gcs_request_duration_seconds` (histogram): latency
//!   distribution by HTTP method and status code
//!
//! # Design Decisions
//! - Metrics are registered against an injected `Registry`, never a global
//! - Labels are (operation, status_code); both sets are bounded

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use tokio::sync::watch;

/// Metric namespace shared by the storage subsystem.
pub const NAMESPACE: &str = "storage";

/// Name of the request-duration histogram (exposed as
/// `storage_gcs_request_duration_seconds`).
pub const REQUEST_DURATION_NAME: &str = "gcs_request_duration_seconds";

/// Build and register the GCS request-duration histogram.
///
/// GCS latency ranges from a few ms to a few secs, so the layout is 6
/// exponential buckets from 5ms to 5s.
pub fn gcs_request_duration(registry: &Registry) -> Result<HistogramVec, prometheus::Error> {
    let opts = HistogramOpts::new(REQUEST_DURATION_NAME, "Time spent doing GCS requests.")
        .namespace(NAMESPACE)
        .buckets(prometheus::exponential_buckets(0.005, 4.0, 6)?);

    let duration = HistogramVec::new(opts, &["operation", "status_code"])?;
    registry.register(Box::new(duration.clone()))?;
    Ok(duration)
}

/// Create the metrics HTTP router.
pub fn metrics_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .route("/ready", get(|| async { (StatusCode::OK, "READY") }))
        .with_state(registry)
}

/// Handle GET /metrics.
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let families = registry.gather();
    let mut buffer = Vec::new();

    match TextEncoder::new().encode(&families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            buffer,
        ),
        Err(error) => {
            tracing::error!(error = %error, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {error}").into_bytes(),
            )
        }
    }
}

/// Serve the metrics endpoint until the shutdown signal fires.
pub async fn serve_metrics(
    addr: SocketAddr,
    registry: Arc<Registry>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let app = metrics_router(registry);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Metrics endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Metrics endpoint shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn bucket_layout_is_exponential_5ms_to_5s() {
        let buckets = prometheus::exponential_buckets(0.005, 4.0, 6).unwrap();
        assert_eq!(buckets, vec![0.005, 0.02, 0.08, 0.32, 1.28, 5.12]);
    }

    #[test]
    fn histogram_carries_the_exact_buckets() {
        let registry = Registry::new();
        let duration = gcs_request_duration(&registry).unwrap();
        duration.with_label_values(&["GET", "200"]).observe(0.012);

        let families = registry.gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "storage_gcs_request_duration_seconds")
            .unwrap();
        let histogram = family.get_metric()[0].get_histogram();
        let bounds: Vec<f64> = histogram
            .get_bucket()
            .iter()
            .map(|b| b.get_upper_bound())
            .collect();

        assert_eq!(bounds, vec![0.005, 0.02, 0.08, 0.32, 1.28, 5.12]);
    }

    #[test]
    fn double_registration_is_rejected() {
        let registry = Registry::new();
        gcs_request_duration(&registry).unwrap();
        assert!(gcs_request_duration(&registry).is_err());
    }

    #[tokio::test]
    async fn health_and_ready_respond() {
        let app = metrics_router(Arc::new(Registry::new()));

        for uri in ["/health", "/ready"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_the_histogram() {
        let registry = Arc::new(Registry::new());
        let duration = gcs_request_duration(&registry).unwrap();
        duration.with_label_values(&["GET", "200"]).observe(0.012);

        let app = metrics_router(registry);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("storage_gcs_request_duration_seconds_bucket"));
        assert!(text.contains("operation=\"GET\""));
    }
}
