// HTTP error responses for service failures
use crate::application::errors::ServiceError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal storage error, the error has been logged";

/// A `ServiceError` on its way out as a JSON `{error}` body.
///
/// Client mistakes become 400 with their message; store failures become 500
/// with a fixed message and the cause goes to the log only.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::BadRequest(format!(
            "request body must be JSON: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        if error.is_client_error() {
            tracing::debug!(error = %error, "rejected request");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": error.to_string() })))
                .into_response();
        }

        tracing::error!(error = %error, "storage failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
