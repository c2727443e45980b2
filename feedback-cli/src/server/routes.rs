use std::sync::Arc;

use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use feedback_lib::Fields;
use serde_json::Value;
use tracing::info;

use super::error::AppError;
use super::metrics::metrics;
use super::state::AppState;

// ── Health ───────────────────────────────────────────────────

pub async fn handle_health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ── POST /api/submit-feedback ────────────────────────────────

pub async fn handle_submit(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, AppError> {
    let fields = match read_fields(request).await {
        Ok(fields) => fields,
        Err(e) => {
            metrics().submissions_total.with_label_values(&["rejected"]).inc();
            return Err(e);
        }
    };

    let submission = match state.store.append(fields).await {
        Ok(submission) => submission,
        Err(e) => {
            metrics().submissions_total.with_label_values(&["error"]).inc();
            return Err(AppError::store("Error submitting feedback")(e));
        }
    };

    metrics().submissions_total.with_label_values(&["ok"]).inc();
    info!(
        "New feedback submission received from: {}",
        submission.field_str("fullName").unwrap_or("Unknown")
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Feedback submitted successfully",
        "id": submission.id,
    }))
    .into_response())
}

/// Accept either a JSON object or an urlencoded HTML form body.
async fn read_fields(request: Request) -> Result<Fields, AppError> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(|_| AppError::MalformedPayload)?;
        return Ok(pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect());
    }

    let Json(fields) = Json::<Fields>::from_request(request, &())
        .await
        .map_err(|_| AppError::MalformedPayload)?;
    Ok(fields)
}

// ── GET /api/submissions (admin) ─────────────────────────────

pub async fn handle_list(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let submissions = state
        .store
        .list_all()
        .await
        .map_err(AppError::store("Error fetching submissions"))?;

    metrics().submissions_stored.set(submissions.len() as i64);

    Ok(Json(serde_json::json!({
        "success": true,
        "count": submissions.len(),
        "submissions": submissions,
    }))
    .into_response())
}

// ── DELETE /api/submissions/{id} (admin) ─────────────────────

pub async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let removed = match state.store.remove(&id).await {
        Ok(removed) => removed,
        Err(e) => {
            metrics().deletes_total.with_label_values(&["error"]).inc();
            return Err(AppError::store("Error deleting submission")(e));
        }
    };

    if !removed {
        metrics().deletes_total.with_label_values(&["not_found"]).inc();
        return Err(AppError::NotFound);
    }

    metrics().deletes_total.with_label_values(&["ok"]).inc();
    info!("Deleted submission {}", id);

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Submission deleted",
    }))
    .into_response())
}
