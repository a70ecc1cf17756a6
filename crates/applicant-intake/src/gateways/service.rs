use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::backend::{BackendError, SubmissionBackend};
use crate::config::IntakeConfig;

/// Shared state behind both gateway endpoints.
pub struct IntakeGateway<B> {
    pub(crate) backend: Arc<B>,
    pub(crate) targets: IntakeConfig,
}

impl<B> IntakeGateway<B>
where
    B: SubmissionBackend + 'static,
{
    pub fn new(backend: Arc<B>, targets: IntakeConfig) -> Self {
        Self { backend, targets }
    }

    pub fn targets(&self) -> &IntakeConfig {
        &self.targets
    }
}

/// Every failure a gateway can answer with. Rendered as `{"error": <display>}`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No file provided.")]
    NoFile,
    #[error("Only PDF files are allowed.")]
    NotPdf,
    #[error("All fields are required")]
    MissingFields,
    #[error("{0}")]
    InvalidBody(String),
    #[error("{0}")]
    Storage(BackendError),
    #[error("Failed to retrieve public URL.")]
    MissingPublicUrl,
    #[error("{0}")]
    Persistence(BackendError),
    #[error("{0}")]
    Unexpected(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoFile
            | GatewayError::NotPdf
            | GatewayError::MissingFields
            | GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::Storage(_)
            | GatewayError::MissingPublicUrl
            | GatewayError::Persistence(_)
            | GatewayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
