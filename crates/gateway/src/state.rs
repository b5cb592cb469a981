use crate::config::{ErrorFormat, GatewayConfig};
use inference::{Prediction, PredictionService};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Successful `/predict` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(rename = "className")]
    pub class_name: String,
    /// Percentage with two decimals, serialized as a string
    pub confidence: String,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            confidence: prediction.confidence(),
            class_name: prediction.class_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "modelLoaded")]
    pub model_loaded: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub upload_dir: Arc<PathBuf>,
    pub upload_field: Arc<str>,
    pub error_format: ErrorFormat,
}

impl AppState {
    pub fn new(service: PredictionService, config: &GatewayConfig) -> Self {
        Self {
            service: Arc::new(service),
            upload_dir: Arc::new(config.upload_dir.clone()),
            upload_field: Arc::from(config.upload_field.as_str()),
            error_format: config.error_format,
        }
    }
}
