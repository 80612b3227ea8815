use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use reqwest::{Method, Request, Url};
use tokio::sync::watch;

use gcs_transport::config::{load_config, TransportConfig};
use gcs_transport::observability::logging::init_logging;
use gcs_transport::observability::metrics::serve_metrics;
use gcs_transport::observability::tracing::init_tracer;
use gcs_transport::observability::{gcs_request_duration, OtelTracer, Tracer};
use gcs_transport::transport::auth::{EnvTokenProvider, StaticTokenProvider, TokenProvider};
use gcs_transport::{Transport, TransportFactory};

#[derive(Parser)]
#[command(name = "gcs-cli")]
#[command(about = "Diagnostic CLI for the instrumented GCS transport", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Authorization scope (defaults to the configured scope)
    #[arg(long)]
    scope: Option<String>,

    /// Bearer token (falls back to the configured token env var)
    #[arg(long, env = "GCS_BEARER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a GET through the instrumented transport
    Get { url: String },
    /// Issue a HEAD through the instrumented transport
    Head { url: String },
    /// Issue GETs on an interval and serve the metrics endpoint
    Watch {
        url: String,

        /// Seconds between requests
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::default(),
    };

    init_logging(&config.observability);
    init_tracer(config.observability.otlp_endpoint.as_deref());

    let registry = Arc::new(Registry::new());
    let duration = gcs_request_duration(&registry)?;
    let tracer: Arc<dyn Tracer> = Arc::new(OtelTracer::new());
    let tokens: Arc<dyn TokenProvider> = match cli.token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(EnvTokenProvider::new(&config.gcs.token_env)),
    };

    let scope = cli.scope.unwrap_or_else(|| config.gcs.scope.clone());
    let factory = TransportFactory::new(duration, tracer, tokens).with_config(config.gcs.clone());
    let transport = factory.build(&scope)?.transport();

    match cli.command {
        Commands::Get { url } => one_shot(&*transport, Method::GET, &url).await?,
        Commands::Head { url } => one_shot(&*transport, Method::HEAD, &url).await?,
        Commands::Watch { url, interval_secs } => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            if config.observability.metrics_enabled {
                let addr = config.observability.metrics_address.parse()?;
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    if let Err(e) = serve_metrics(addr, registry, shutdown_rx).await {
                        tracing::error!(error = %e, "Metrics endpoint error");
                    }
                });
            }

            let target: Url = url.parse()?;
            loop {
                let request = Request::new(Method::GET, target.clone());
                match transport.execute(request).await {
                    Ok(response) => {
                        tracing::info!(status = %response.status(), url = %target, "Probe complete")
                    }
                    Err(error) => tracing::warn!(error = %error, url = %target, "Probe failed"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                        break;
                    }
                }
            }
            let _ = shutdown_tx.send(true);
        }
    }

    // dump the metric state so one-shot runs still show what was recorded
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    print!("{}", String::from_utf8(buffer)?);

    Ok(())
}

async fn one_shot(
    transport: &dyn Transport,
    method: Method,
    url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = Request::new(method, url.parse()?);
    let started = Instant::now();

    match transport.execute(request).await {
        Ok(response) => {
            let summary = serde_json::json!({
                "status": response.status().as_u16(),
                "elapsed_ms": started.elapsed().as_millis() as u64,
                "content_length": response.content_length(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(error) => {
            eprintln!("request failed: {error}");
        }
    }

    Ok(())
}
