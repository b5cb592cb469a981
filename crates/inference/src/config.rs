use crate::backend::ExecutionProvider;
use crate::preprocessing::TensorLayout;
use common::{env_or, env_parse};
use std::path::PathBuf;

pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_size: u32,
    pub layout: TensorLayout,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
    /// Re-read the class index table on every prediction instead of once at startup
    pub reload_labels: bool,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let model_path = PathBuf::from(env_or("MODEL_PATH", "public/Model/model.onnx"));
        let labels_path = PathBuf::from(env_or("LABELS_PATH", "public/Model/class_indices.json"));

        let input_size = env_parse("INPUT_SIZE", DEFAULT_INPUT_SIZE)?;
        if input_size == 0 {
            anyhow::bail!("INPUT_SIZE must be greater than zero");
        }

        let intra_threads = env_parse("INTRA_THREADS", 4usize)?;
        if intra_threads == 0 {
            anyhow::bail!("INTRA_THREADS must be greater than zero");
        }

        Ok(Self {
            model_path,
            labels_path,
            input_size,
            layout: env_parse("TENSOR_LAYOUT", TensorLayout::Nhwc)?,
            execution_provider: env_parse("EXECUTION_PROVIDER", ExecutionProvider::Cpu)?,
            intra_threads,
            reload_labels: env_parse("RELOAD_LABELS", false)?,
        })
    }

    /// Shape of the tensor the model expects, batch dimension included
    pub fn input_shape(&self) -> Vec<usize> {
        self.layout.input_shape(self.input_size)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("public/Model/model.onnx"),
            labels_path: PathBuf::from("public/Model/class_indices.json"),
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::Nhwc,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 4,
            reload_labels: false,
        }
    }
}
