//! Tracing subscriber setup.

use super::tracer;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the span file inside the data directory.
pub const TRACE_FILE_NAME: &str = "gestly-traces.jsonl";

/// Installs the global tracing subscriber.
///
/// The pipeline is:
///
/// ```text
/// tracing macros ─▶ EnvFilter ─┬─▶ fmt layer (stderr)
///                              └─▶ OpenTelemetry layer ─▶ FileSpanExporter ─▶ <data_dir>/gestly-traces.jsonl
/// ```
///
/// # Level Resolution
///
/// 1. `RUST_LOG` if set and valid
/// 2. `config.trace_level`
/// 3. `"info"`
///
/// If the data directory cannot be created, spans are not exported and only
/// the stderr layer is installed. Returns `false` when a global subscriber was
/// already set, in which case nothing changes.
///
/// # Example
///
/// ```no_run
/// use gestly::observability::init_tracing;
/// use gestly::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Config::default()
/// };
///
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) -> bool {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let data_dir = config.data_dir();
    let otel_layer = std::fs::create_dir_all(&data_dir).ok().map(|()| {
        let resource = Resource::new(vec![opentelemetry::KeyValue::new("service.name", "gestly")]);
        let provider = tracer::create_tracer_provider(data_dir.join(TRACE_FILE_NAME), resource);
        OpenTelemetryLayer::new(provider.tracer("gestly"))
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .is_ok()
}
