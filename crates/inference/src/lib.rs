pub mod backend;
pub mod config;
pub mod error;
pub mod host;
pub mod labels;
pub mod postprocessing;
pub mod preprocessing;
pub mod service;

// Re-export commonly used types for convenience
pub use backend::{ExecutionProvider, InferenceBackend, InferenceOutput};
pub use config::InferenceConfig;
pub use error::{ClassIndexError, InferenceError, PredictError};
pub use host::ModelHost;
pub use labels::{ClassIndex, LabelSource};
pub use postprocessing::Prediction;
pub use preprocessing::{PreProcessor, TensorLayout};
pub use service::PredictionService;
