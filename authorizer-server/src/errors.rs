use authorizer::IssuanceError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use log::error;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with an error code, message and status code
    pub fn new<S: ToString>(error: &'static str, message: S, status_code: StatusCode) -> Self {
        Self {
            error,
            message: message.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with a message
    pub fn internal<S: ToString>(message: S) -> Self {
        Self::new("internal_error", message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Request Error (400) with a message
    pub fn bad_request<S: ToString>(message: S) -> Self {
        Self::new("invalid_request", message, StatusCode::BAD_REQUEST)
    }
}

impl From<IssuanceError> for ApiError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::InvalidRequest(message) => Self::bad_request(message),
            IssuanceError::Internal(cause) => {
                error!("Credential issuance failed: {cause}");
                Self::internal("Failed to issue token")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "error": self.error,
            "message": self.message,
        });
        (self.status_code, Json(body)).into_response()
    }
}
