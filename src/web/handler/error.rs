use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::JournalError;

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        match self {
            JournalError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "not found", "message": self.to_string()})),
            )
                .into_response(),
            JournalError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "bad request", "field": field, "message": message})),
            )
                .into_response(),
            other => {
                log::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal server error"})),
                )
                    .into_response()
            }
        }
    }
}
