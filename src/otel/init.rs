//! Subscriber setup.
//!
//! Console logging goes to stderr so it never interleaves with answers on
//! stdout. Span export over OTLP/gRPC is enabled only when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use crate::types::{FinqError, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Flushes exported spans on drop.
pub struct OtelGuard {
    tracer_provider: Option<TracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Arguments
///
/// * `service_name` - `service.name` resource attribute for exported spans
/// * `default_filter` - Filter used when `RUST_LOG` is unset
/// * `json` - Emit JSON log lines instead of text
///
/// # Errors
///
/// Returns `FinqError::Config` if the exporter cannot be built or a global
/// subscriber is already installed
///
/// Must run inside a Tokio runtime when exporting (batch exporter).
pub fn init_tracing(service_name: &str, default_filter: &str, json: bool) -> Result<OtelGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|e| !e.trim().is_empty());

    let tracer_provider = match endpoint {
        Some(endpoint) => Some(build_provider(service_name, &endpoint)?),
        None => None,
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()))
    });

    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| FinqError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::debug!(
        service = service_name,
        otlp = tracer_provider.is_some(),
        "Tracing initialized"
    );

    Ok(OtelGuard { tracer_provider })
}

fn build_provider(service_name: &str, endpoint: &str) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| FinqError::Config(format!("OTLP exporter build failed: {}", e)))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build())
}
