//! Response bodies and the error-to-status mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::catalog::ModelInfo;
use crate::error::FiestaError;

/// Body of every request-level failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default_selection: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub upstream_configured: bool,
}

impl FiestaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FiestaError::Validation(_) => StatusCode::BAD_REQUEST,
            FiestaError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FiestaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(
            FiestaError::validation("models[] required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FiestaError::MissingApiKey("OPENROUTER_API_KEY".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            FiestaError::Internal("join".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_key_message() {
        let err = FiestaError::MissingApiKey("OPENROUTER_API_KEY".into());
        assert_eq!(err.to_string(), "OPENROUTER_API_KEY not configured");
    }
}
