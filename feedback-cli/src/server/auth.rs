use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use feedback_lib::auth::BASIC_CHALLENGE;
use feedback_lib::Decision;

use super::metrics::metrics;
use super::state::AppState;

/// Middleware guarding admin routes with HTTP Basic credentials.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.gate.authorize_header(header) {
        Decision::Allow => next.run(request).await,
        Decision::Deny => {
            metrics().auth_denied.inc();
            unauthorized()
        }
    }
}

/// Return 401 Unauthorized with a Basic challenge so browsers prompt for credentials.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, BASIC_CHALLENGE)],
        "Authentication required",
    )
        .into_response()
}
