use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure to bring the model artifact into memory. Fatal at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0:?}")]
    Missing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("incompatible model artifact: {0}")]
    Incompatible(String),
}

/// Failure of the inference engine on a well-formed request.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid model output: {0}")]
    InvalidOutput(String),

    #[error("inference engine failure: {0}")]
    Engine(String),

    #[error("inference did not finish within {0} ms")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("message is empty")]
    EmptyInput,

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ClassifyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClassifyError::EmptyInput => StatusCode::BAD_REQUEST,
            ClassifyError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::Inference(InferenceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ClassifyError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            ClassifyError::EmptyInput => {
                Some("Provide {\"message\": \"...\"} with non-whitespace text".to_string())
            }
            ClassifyError::ModelLoad(_) => {
                Some("Check GET /health; the model artifact must be redeployed".to_string())
            }
            ClassifyError::Inference(_) => None,
        }
    }
}

impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            hint: self.hint(),
        };
        (self.status(), Json(body)).into_response()
    }
}
