use crate::config::Environment;
use tracing_subscriber::{Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) type OtelLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: pretty output in development, JSON in production.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. The OpenTelemetry layer
/// is a no-op until a tracer provider is registered; when spans should be
/// exported use [`crate::TelemetryGuard::init`] instead of this function.
pub fn setup_logging(environment: Environment) -> anyhow::Result<()> {
    init_subscriber(environment, tracing_opentelemetry::layer().boxed())
}

pub(crate) fn init_subscriber(environment: Environment, otel_layer: OtelLayer) -> anyhow::Result<()> {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let registry = tracing_subscriber::registry()
        .with(otel_layer)
        .with(env_filter);

    match environment {
        Environment::Production => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_current_span(true),
            )
            .try_init()?,
        Environment::Development => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
            .try_init()?,
    }

    Ok(())
}
