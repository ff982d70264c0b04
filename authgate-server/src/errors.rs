use authgate_core::AuthError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use log::{error, warn};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Unauthorized (401) with the generic denial message
    pub fn unauthorized() -> Self {
        Self::new("Unauthorized", StatusCode::UNAUTHORIZED)
    }

    /// Create new Not Found (404) with a detail message
    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::NOT_FOUND)
    }

    /// Create new Service Unavailable (503) with a detail message
    pub fn service_unavailable<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::SERVICE_UNAVAILABLE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

/// Every authentication or authorization failure gets the same body, so a
/// client cannot tell which check rejected it.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_rejection() {
            warn!("Request rejected: {}", err);
            return ApiError::unauthorized();
        }

        match err {
            AuthError::UnknownProvider(name) => {
                warn!("Unknown OAuth provider requested: {}", name);
                ApiError::not_found("Unknown provider")
            }
            AuthError::StoreUnavailable(reason) => {
                error!("Token store unavailable: {}", reason);
                ApiError::service_unavailable("Service unavailable")
            }
            other => {
                error!("Internal authentication error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}
