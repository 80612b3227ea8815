//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::Context;
use reqwest::header::HeaderMap;
use reqwest::{Request, Response, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gcs_transport::observability::tracing::TraceExtractionError;
use gcs_transport::transport::auth::AuthError;
use gcs_transport::{Span, Tracer, Transport, TransportError};

/// Start a mock HTTP backend returning a fixed response.
///
/// Returns the bound address and the captured request heads (everything up
/// to the blank line), one entry per connection.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&heads);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let captured = Arc::clone(&captured);
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        captured
                            .lock()
                            .unwrap()
                            .push(String::from_utf8_lossy(&head).into_owned());

                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, heads)
}

/// Everything one span saw, for assertions.
#[derive(Clone, Default)]
pub struct SpanRecord {
    pub name: String,
    pub parented: bool,
    pub tags: Vec<(&'static str, String)>,
    pub errors: Vec<String>,
    pub finishes: u32,
}

/// `Tracer` that records every span instead of exporting it.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl RecordingTracer {
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().unwrap().clone()
    }
}

impl Tracer for RecordingTracer {
    fn extract(&self, headers: &HeaderMap) -> Result<Context, TraceExtractionError> {
        if headers.contains_key("traceparent") {
            Ok(Context::new())
        } else {
            Err(TraceExtractionError::Missing)
        }
    }

    fn start_span(&self, name: &str, parent: Option<Context>) -> Box<dyn Span> {
        let mut spans = self.spans.lock().unwrap();
        spans.push(SpanRecord {
            name: name.to_string(),
            parented: parent.is_some(),
            ..Default::default()
        });
        Box::new(RecordingSpan {
            spans: Arc::clone(&self.spans),
            index: spans.len() - 1,
        })
    }
}

struct RecordingSpan {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
    index: usize,
}

impl Span for RecordingSpan {
    fn tag(&mut self, key: &'static str, value: &str) {
        self.spans.lock().unwrap()[self.index]
            .tags
            .push((key, value.to_string()));
    }

    fn record_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.spans.lock().unwrap()[self.index]
            .errors
            .push(error.to_string());
    }
}

impl Drop for RecordingSpan {
    fn drop(&mut self) {
        self.spans.lock().unwrap()[self.index].finishes += 1;
    }
}

/// Programmable inner transport; fails PUT requests when `fail_puts` is
/// set, otherwise answers with `status` after `delay`.
pub struct MockTransport {
    pub status: StatusCode,
    pub delay: Option<Duration>,
    pub fail_puts: bool,
}

impl MockTransport {
    pub fn ok(status: StatusCode) -> Self {
        Self {
            status,
            delay: None,
            fail_puts: false,
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_puts && request.method() == reqwest::Method::PUT {
            return Err(TransportError::Auth(AuthError::MissingCredentials(
                "MOCK_TOKEN".into(),
            )));
        }
        let response = axum::http::Response::builder()
            .status(self.status)
            .body("")
            .unwrap();
        Ok(Response::from(response))
    }
}
