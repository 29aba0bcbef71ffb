//! Mapping of store errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bizdesk_core::BizDeskError;

/// Handler error: renders as `{"ok": false, "error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub BizDeskError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BizDeskError::Validation(_) => StatusCode::BAD_REQUEST,
            BizDeskError::NotFound(_) => StatusCode::NOT_FOUND,
            BizDeskError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BizDeskError> for ApiError {
    fn from(err: BizDeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }
        let body = serde_json::json!({"ok": false, "error": self.0.to_string()});
        (status, Json(body)).into_response()
    }
}
