use crate::backend::InferenceBackend;
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use common::span;
use ndarray::{Array, IxDyn};
use std::sync::Mutex;

type SharedBackend = Mutex<Box<dyn InferenceBackend + Send>>;

/// Owns the loaded model for the lifetime of the process.
///
/// A host whose model failed to load stays usable: every [`ModelHost::classify`]
/// call then fails with [`InferenceError::ModelUnavailable`]. Invocations are
/// serialized through a mutex because backends take `&mut self`.
pub struct ModelHost {
    model: Option<SharedBackend>,
    input_shape: Vec<usize>,
}

impl ModelHost {
    /// Load the model named by `config`, degrading instead of failing.
    pub fn initialize<B>(config: &InferenceConfig) -> Self
    where
        B: InferenceBackend + Send + 'static,
    {
        tracing::info!(
            model_path = %config.model_path.display(),
            provider = config.execution_provider.as_str(),
            "Loading inference model"
        );

        match B::load_model(config) {
            Ok(backend) => {
                tracing::info!("Model loaded successfully");
                Self::from_backend(backend, config.input_shape())
            }
            Err(e) => {
                tracing::error!(
                    error = %format!("{e:#}"),
                    model_path = %config.model_path.display(),
                    "Failed to load model; predictions will fail until restart"
                );
                Self::unavailable(config.input_shape())
            }
        }
    }

    pub fn from_backend<B>(backend: B, input_shape: Vec<usize>) -> Self
    where
        B: InferenceBackend + Send + 'static,
    {
        Self {
            model: Some(Mutex::new(Box::new(backend))),
            input_shape,
        }
    }

    pub fn unavailable(input_shape: Vec<usize>) -> Self {
        Self {
            model: None,
            input_shape,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Run the model once and return the flattened per-class scores.
    ///
    /// Blocking; call from a blocking-capable thread in async contexts.
    pub fn classify(&self, input: &Array<f32, IxDyn>) -> Result<Vec<f32>, InferenceError> {
        let model = self.model.as_ref().ok_or(InferenceError::ModelUnavailable)?;

        if input.shape() != self.input_shape.as_slice() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.input_shape.clone(),
                actual: input.shape().to_vec(),
            });
        }

        let mut backend = model
            .lock()
            .map_err(|_| InferenceError::Runtime("model lock poisoned".to_string()))?;

        let output = {
            let _s = span!("model_inference");
            backend
                .infer(input)
                .map_err(|e| InferenceError::Runtime(format!("{e:#}")))?
        };

        let scores: Vec<f32> = output.scores.iter().copied().collect();
        if scores.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }

        tracing::trace!(classes = scores.len(), "Model invocation complete");
        Ok(scores)
    }
}
