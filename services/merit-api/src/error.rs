use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use merit_common::error::MeritError;

pub struct ApiError(pub MeritError);

impl From<MeritError> for ApiError {
    fn from(err: MeritError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MeritError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            MeritError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
