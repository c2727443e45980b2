use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feedback_lib::StoreError;
use thiserror::Error;
use tracing::error;

/// Failures of the public and admin API endpoints.
///
/// Responses carry a `success`/`message` pair only; store detail is logged,
/// never sent to the client.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Submission not found")]
    NotFound,

    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    pub fn store(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AppError::Store { message, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store { message, source } => {
                error!("{}: {}", message, source);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
