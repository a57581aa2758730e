//! OpenTelemetry trace export.
//!
//! Installs a batched OTLP/gRPC tracer provider as the global provider. Spans
//! are always sampled. Nothing in the request path creates spans yet; this only
//! makes a provider available to code that asks `opentelemetry::global` for a
//! tracer.

use std::time::Duration;

use opentelemetry::trace::TraceError;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self as sdktrace, Sampler, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "inventory-service";
pub const DEFAULT_OTLP_ENDPOINT: &str = "localhost:4317";

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// `OTEL_EXPORTER_OTLP_ENDPOINT`, or the local collector when unset or empty.
pub fn otlp_endpoint() -> String {
    endpoint_or_default(std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok())
}

fn endpoint_or_default(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_OTLP_ENDPOINT.to_string(),
    }
}

/// tonic needs a scheme; a bare `host:port` means plaintext gRPC.
fn collector_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

fn resource() -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}

/// Must be called from inside the Tokio runtime; the batch processor runs on it.
pub fn init_tracer(endpoint: &str) -> Result<TracerProvider, TraceError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(collector_url(endpoint));

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            sdktrace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(resource()),
        )
        .install_batch(runtime::Tokio)?;

    global::set_tracer_provider(provider.clone());
    info!(endpoint, "OTLP trace exporter configured");

    Ok(provider)
}

/// Flushes queued spans and stops the exporter. Gives up after five seconds;
/// failures are logged, never returned.
pub async fn shutdown(provider: TracerProvider) {
    // The SDK's shutdown blocks until the batch task acknowledges.
    let drain = tokio::task::spawn_blocking(move || provider.shutdown());

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await {
        Ok(Ok(Ok(()))) => info!("Tracer provider shut down"),
        Ok(Ok(Err(e))) => warn!(error = %e, "Error shutting down tracer provider"),
        Ok(Err(e)) => warn!(error = %e, "Tracer shutdown task failed"),
        Err(_) => warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Timed out shutting down tracer provider"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_local_collector() {
        assert_eq!(endpoint_or_default(None), "localhost:4317");
        assert_eq!(endpoint_or_default(Some(String::new())), "localhost:4317");
        assert_eq!(endpoint_or_default(Some("  ".to_string())), "localhost:4317");
    }

    #[test]
    fn keeps_configured_endpoint() {
        assert_eq!(
            endpoint_or_default(Some("otel-collector:4317".to_string())),
            "otel-collector:4317"
        );
    }

    #[test]
    fn bare_host_port_gets_http_scheme() {
        assert_eq!(collector_url("localhost:4317"), "http://localhost:4317");
        assert_eq!(collector_url("https://otel.example:4317"), "https://otel.example:4317");
    }

    #[test]
    fn resource_identifies_the_service() {
        let resource = resource();
        assert_eq!(
            resource.get("service.name".into()),
            Some(SERVICE_NAME.into())
        );
        assert!(resource.get("service.version".into()).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn installs_and_shuts_down_without_a_collector() {
        let provider = init_tracer("127.0.0.1:1").unwrap();
        let started = std::time::Instant::now();

        shutdown(provider).await;

        assert!(started.elapsed() <= SHUTDOWN_TIMEOUT + Duration::from_secs(1));
    }
}
