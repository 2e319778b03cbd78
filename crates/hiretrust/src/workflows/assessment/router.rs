use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::debug;

use super::domain::CandidateId;
use super::service::{AnswerSubmission, AssessmentEngine, AssessmentError};
use crate::error::AppError;

/// Header carrying the authenticated candidate; token checks happen upstream.
pub const CANDIDATE_HEADER: &str = "x-candidate-id";

/// Router builder exposing the candidate-facing assessment endpoints.
pub fn assessment_router(engine: Arc<AssessmentEngine>) -> Router {
    Router::new()
        .route("/api/v1/assessment/start", post(start_handler))
        .route("/api/v1/assessment/next", get(next_handler))
        .route("/api/v1/assessment/submit", post(submit_handler))
        .route("/api/v1/assessment/tab-switch", post(tab_switch_handler))
        .route("/api/v1/assessment/results", get(results_handler))
        .route("/api/v1/assessment/retake", post(retake_handler))
        .route("/api/v1/assessment/access", get(access_handler))
        .with_state(engine)
}

fn candidate(headers: &HeaderMap) -> Result<CandidateId, Response> {
    headers
        .get(CANDIDATE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| CandidateId(value.to_string()))
        .ok_or_else(|| {
            let payload = json!({
                "error": "missing candidate identity",
            });
            (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
        })
}

fn failure(error: AssessmentError) -> Response {
    AppError::from(error).into_response()
}

pub(crate) async fn start_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.start_or_resume_session(&candidate).await {
        Ok(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn next_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.next_question(&candidate).await {
        Ok(next) => {
            debug!(%candidate, "next question served");
            (StatusCode::OK, axum::Json(next)).into_response()
        }
        Err(error) => failure(error),
    }
}

pub(crate) async fn submit_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<AnswerSubmission>,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.submit_answer(&candidate, submission).await {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn tab_switch_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.record_tab_switch(&candidate).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn results_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.get_results(&candidate).await {
        // `null` until the candidate starts a session.
        Ok(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn retake_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.retake(&candidate).await {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn access_handler(
    State(engine): State<Arc<AssessmentEngine>>,
    headers: HeaderMap,
) -> Response {
    let candidate = match candidate(&headers) {
        Ok(candidate) => candidate,
        Err(rejection) => return rejection,
    };

    match engine.feature_access(&candidate).await {
        Ok(access) => (StatusCode::OK, axum::Json(access)).into_response(),
        Err(error) => failure(error),
    }
}
