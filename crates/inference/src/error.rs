use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model is not loaded")]
    ModelUnavailable,

    #[error("Input shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Model returned no usable scores")]
    EmptyOutput,

    #[error("Inference failed: {0}")]
    Runtime(String),
}

#[derive(Error, Debug)]
pub enum ClassIndexError {
    #[error("Failed to read class index table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed class index table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Class index key {0:?} is not a canonical non-negative integer")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to prepare input tensor: {0}")]
    Preprocess(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Predicted class index {index} has no label (table has {table_len} entries)")]
    Lookup { index: usize, table_len: usize },

    #[error(transparent)]
    Labels(#[from] ClassIndexError),
}

impl PredictError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Decode(_) => "decode_error",
            PredictError::Inference(InferenceError::ModelUnavailable) => "model_unavailable",
            PredictError::Preprocess(_) | PredictError::Inference(_) => "inference_error",
            PredictError::Lookup { .. } | PredictError::Labels(_) => "lookup_error",
        }
    }
}
