use gateway::{AppState, GatewayConfig, logging::setup_logging, run_server};
use inference::{LabelSource, ModelHost, PreProcessor, PredictionService};

#[cfg(feature = "ort-backend")]
use inference::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The gateway binary needs an inference backend: enable the 'ort-backend' feature");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let _telemetry = setup_logging(&config)?;

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // A model that fails to load leaves the server up in degraded mode
    let inference_config = config.inference.clone();
    let host =
        tokio::task::spawn_blocking(move || ModelHost::initialize::<Backend>(&inference_config))
            .await?;

    let labels = LabelSource::from_config(&config.inference).await?;
    let service = PredictionService::new(host, PreProcessor::from_config(&config.inference), labels);

    run_server(&config, AppState::new(service, &config)).await
}
