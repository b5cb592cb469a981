use common::{env_or, env_parse};
use inference::InferenceConfig;
use std::path::PathBuf;
use std::str::FromStr;

pub use common::Environment;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shape of error response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `{"error": <kind>, "detail": <message>}`
    Structured,
    /// The message alone as `text/plain`
    Plain,
}

impl ErrorFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorFormat::Structured => "structured",
            ErrorFormat::Plain => "plain",
        }
    }
}

impl FromStr for ErrorFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" | "json" => Ok(Self::Structured),
            "plain" | "text" => Ok(Self::Plain),
            other => Err(format!(
                "{} is not a supported error format. Use either `structured` or `plain`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub addr: String,
    pub upload_dir: PathBuf,
    pub upload_field: String,
    pub body_limit_bytes: usize,
    pub error_format: ErrorFormat,
    pub otel_endpoint: Option<String>,
    pub inference: InferenceConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let upload_field = env_or("GATEWAY_UPLOAD_FIELD", "image");
        if upload_field.trim().is_empty() {
            anyhow::bail!("GATEWAY_UPLOAD_FIELD must not be empty");
        }

        Ok(Self {
            environment,
            addr: env_or("GATEWAY_ADDR", "0.0.0.0:3000"),
            upload_dir: PathBuf::from(env_or("GATEWAY_UPLOAD_DIR", "uploads")),
            upload_field,
            body_limit_bytes: env_parse("GATEWAY_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?,
            error_format: env_parse("GATEWAY_ERROR_FORMAT", ErrorFormat::Structured)?,
            otel_endpoint: common::otel_endpoint(),
            inference: InferenceConfig::from_env()?,
        })
    }
}
