use crate::config::ErrorFormat;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inference::{InferenceError, PredictError};
use serde::Serialize;
use std::io;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    Lookup(String),

    #[error("{0}")]
    Io(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::ModelUnavailable(_) => "model_unavailable",
            ApiError::Decode(_) => "decode_error",
            ApiError::Inference(_) => "inference_error",
            ApiError::Lookup(_) => "lookup_error",
            ApiError::Io(_) => "io_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ModelUnavailable(_)
            | ApiError::Decode(_)
            | ApiError::Inference(_)
            | ApiError::Lookup(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response_with(self, format: ErrorFormat) -> Response {
        let status = self.status_code();

        match format {
            ErrorFormat::Structured => {
                let body = ErrorResponse {
                    error: self.kind(),
                    detail: self.to_string(),
                };
                (status, Json(body)).into_response()
            }
            ErrorFormat::Plain => (status, self.to_string()).into_response(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(ErrorFormat::Structured)
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let msg = err.to_string();
        match err {
            PredictError::Decode(_) => ApiError::Decode(msg),
            PredictError::Inference(InferenceError::ModelUnavailable) => {
                ApiError::ModelUnavailable(msg)
            }
            PredictError::Preprocess(_) | PredictError::Inference(_) => ApiError::Inference(msg),
            PredictError::Lookup { .. } | PredictError::Labels(_) => ApiError::Lookup(msg),
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        ApiError::Io(format!("IO error: {}", err))
    }
}
