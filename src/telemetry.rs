use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// OTLP export is enabled only when this variable points at a collector
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name("herald").build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .build()
        .context("Failed to create trace exporter")?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn init_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder()
        .with_http()
        .build()
        .context("Failed to create metric exporter")?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Console output on stderr is always on. `log_dir` adds a daily rolling log
/// file, and the OpenTelemetry trace and metric layers are added when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_tracing_subscriber(log_dir: Option<&Path>) -> TelemetryGuard {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "herald.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let otel = if std::env::var_os(OTLP_ENDPOINT_VAR).is_some() {
        match init_traces().and_then(|traces| Ok((traces, init_metrics()?))) {
            Ok((tracer_provider, meter_provider)) => Some(OtelGuard {
                tracer_provider,
                meter_provider,
            }),
            Err(err) => {
                eprintln!("OpenTelemetry disabled: {err:#}");
                None
            }
        }
    } else {
        None
    };

    let metrics_layer = otel
        .as_ref()
        .map(|guard| MetricsLayer::new(guard.meter_provider.clone()));
    let trace_layer = otel
        .as_ref()
        .map(|guard| OpenTelemetryLayer::new(guard.tracer_provider.tracer("herald")));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(metrics_layer)
        .with(trace_layer)
        .init();

    TelemetryGuard {
        _otel: otel,
        _file: file_guard,
    }
}

/// Keeps exporters and the log file writer alive until the process ends
pub struct TelemetryGuard {
    _otel: Option<OtelGuard>,
    _file: Option<WorkerGuard>,
}

pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("{err:?}");
        }
        if let Err(err) = self.meter_provider.shutdown() {
            eprintln!("{err:?}");
        }
    }
}
