use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::assessment::domain::Category;
use crate::workflows::assessment::oracle::OfflineOracle;
use crate::workflows::assessment::router::{assessment_router, CANDIDATE_HEADER};

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CANDIDATE_HEADER, "cand-7")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn missing_candidate_header_is_unauthorized() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let response = assessment_router(harness.engine.clone())
        .oneshot(
            Request::post("/api/v1/assessment/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "missing candidate identity");
}

#[tokio::test]
async fn start_route_returns_the_session() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let response = assessment_router(harness.engine.clone())
        .oneshot(request("POST", "/api/v1/assessment/start"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["current_step"], 1);
    assert_eq!(body["status"], "started");
    assert_eq!(body["experience_band"], "fresher");
}

#[tokio::test]
async fn next_route_serves_a_catalog_question() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let response = assessment_router(harness.engine.clone())
        .oneshot(request("GET", "/api/v1/assessment/next"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["category"], "behavioral");
    assert!(body["text"].as_str().is_some_and(|text| !text.is_empty()));
}

#[tokio::test]
async fn submit_route_grades_and_stores() {
    let harness = Harness::new(Arc::new(ScriptedOracle::grading(&[5])));
    harness
        .engine
        .start_or_resume_session(&candidate())
        .await
        .expect("session starts");

    let payload = json!({
        "question_id": "fresher-behavioral-1",
        "category": Category::Behavioral,
        "answer": "I re-planned the sprint with the team and shipped on time.",
        "difficulty": "medium",
        "metadata": {
            "text": "Describe a time priorities changed overnight.",
            "driver": "adaptability",
            "tab_switches": 0
        }
    });
    let response = assessment_router(harness.engine.clone())
        .oneshot(
            Request::post("/api/v1/assessment/submit")
                .header(CANDIDATE_HEADER, "cand-7")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["score"], 5);
    assert_eq!(body["is_skipped"], false);
    assert_eq!(body["assessment_complete"], false);
}

#[tokio::test]
async fn results_route_is_null_before_start() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let response = assessment_router(harness.engine.clone())
        .oneshot(request("GET", "/api/v1/assessment/results"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(read_json(response).await.is_null());
}

#[tokio::test]
async fn tab_switch_route_without_session_is_not_found() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let response = assessment_router(harness.engine.clone())
        .oneshot(request("POST", "/api/v1/assessment/tab-switch"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blocked_candidates_are_forbidden() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let router = assessment_router(harness.engine.clone());
    router
        .clone()
        .oneshot(request("POST", "/api/v1/assessment/start"))
        .await
        .unwrap();

    let warning = router
        .clone()
        .oneshot(request("POST", "/api/v1/assessment/tab-switch"))
        .await
        .unwrap();
    assert_eq!(read_json(warning).await["status"], "warning");

    let blocked = router
        .clone()
        .oneshot(request("POST", "/api/v1/assessment/tab-switch"))
        .await
        .unwrap();
    assert_eq!(read_json(blocked).await["status"], "blocked");

    let response = router
        .oneshot(request("GET", "/api/v1/assessment/next"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn access_and_retake_routes_respond() {
    let harness = Harness::new(Arc::new(OfflineOracle));
    let router = assessment_router(harness.engine.clone());

    let access = router
        .clone()
        .oneshot(request("GET", "/api/v1/assessment/access"))
        .await
        .unwrap();
    assert_eq!(access.status(), StatusCode::OK);
    let body = read_json(access).await;
    assert_eq!(body["profile_visible"], false);
    assert_eq!(body["chat_enabled"], false);
    assert_eq!(body["assessment_status"], "not_started");

    let retake = router
        .oneshot(request("POST", "/api/v1/assessment/retake"))
        .await
        .unwrap();
    assert_eq!(retake.status(), StatusCode::OK);
    let body = read_json(retake).await;
    assert_eq!(body["status"], "started");
    assert_eq!(body["session"]["current_step"], 1);
}
