//! Logging and OpenTelemetry setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default `catalyx=info,tower_http=info`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP/HTTP endpoint, enables span export
//!   when built with `--features telemetry`
//! - `OTEL_SERVICE_NAME`: service name (default: catalyx-server)

use crate::config::{LogFormat, LogSection};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "catalyx=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "catalyx-server.log";

/// Keeps the log writer and the span exporter alive until shutdown
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TelemetryGuard {
    /// Flush pending spans
    pub fn shutdown(self) {
        #[cfg(feature = "telemetry")]
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = ?e, "OpenTelemetry shutdown failed");
            }
        }
    }
}

/// Install the global subscriber: env filter, stdout (pretty or JSON),
/// optional rolling file and optional OTLP span export.
pub fn init(log: &LogSection) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("invalid log filter")?;

    let (pretty, json) = match log.format {
        LogFormat::Json => (None, Some(fmt::layer().json())),
        LogFormat::Pretty => (Some(fmt::layer().pretty()), None),
    };

    let (file_layer, file_guard) = match log.dir.as_deref().filter(|d| !d.is_empty()) {
        Some(dir) => {
            let dir = shellexpand::tilde(dir).into_owned();
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    #[cfg(feature = "telemetry")]
    let (otel_layer, provider) = match otel::tracer()? {
        Some((tracer, provider)) => (
            Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Some(provider),
        ),
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .with(file_layer);

    #[cfg(feature = "telemetry")]
    registry.with(otel_layer).init();
    #[cfg(not(feature = "telemetry"))]
    {
        registry.init();
        if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
            tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
        }
    }

    Ok(TelemetryGuard {
        _file_guard: file_guard,
        #[cfg(feature = "telemetry")]
        provider,
    })
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use opentelemetry_sdk::Resource;

    /// `None` when no OTLP endpoint is configured
    pub fn tracer() -> Result<Option<(Tracer, TracerProvider)>> {
        let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
            return Ok(None);
        };
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "catalyx-server".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name.clone(),
            )]))
            .build();
        opentelemetry::global::set_tracer_provider(provider.clone());

        Ok(Some((provider.tracer(service_name), provider)))
    }
}
