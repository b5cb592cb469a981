use crate::config::GatewayConfig;
use common::TelemetryGuard;

/// Install logging, exporting over OTLP when an endpoint is configured.
///
/// The returned guard must live until shutdown so pending spans are flushed.
pub fn setup_logging(config: &GatewayConfig) -> anyhow::Result<Option<TelemetryGuard>> {
    match config.otel_endpoint.as_deref() {
        Some(endpoint) => TelemetryGuard::init("gateway", endpoint, config.environment).map(Some),
        None => {
            common::setup_logging(config.environment)?;
            Ok(None)
        }
    }
}
