use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
/// Serializes as `{ "error": "..." }` so HTTP clients get structured messages.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Llm(_) | AppError::Serde(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            AppError::NotFound("offer".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            AppError::Validation("missing item_id".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_llm_maps_to_500() {
        assert_eq!(
            AppError::Llm("backend unreachable".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
