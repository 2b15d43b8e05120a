//! Integration tests for the HTTP reward reconciler against a mock server.

use chrono::Utc;
use focusarena_core::{
    FocusMode, HttpReconciler, OutcomeStatus, ReconcileError, Reconciler, SessionOutcome,
};
use mockito::Matcher;
use serde_json::json;
use uuid::Uuid;

fn completed_deep_work() -> SessionOutcome {
    let now = Utc::now();
    SessionOutcome {
        session_id: Uuid::new_v4(),
        mode: FocusMode::DeepWork,
        status: OutcomeStatus::Completed,
        elapsed_secs: 3_000,
        xp_earned: 120,
        hp_remaining: 90,
        penalty_count: 2,
        forced: false,
        started_at: now,
        ended_at: now,
    }
}

#[tokio::test]
async fn records_outcome_with_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/focus/sessions")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(json!({
            "mode": "deep-work",
            "durationSeconds": 3000,
            "xpEarned": 120,
            "hpRemaining": 90,
            "status": "completed"
        })))
        .with_status(201)
        .create_async()
        .await;

    let reconciler =
        HttpReconciler::new(&format!("{}/api", server.url()), Some("secret".into())).unwrap();
    reconciler.record_outcome(&completed_deep_work()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn persists_hp() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/user/hp")
        .match_body(Matcher::Json(json!({ "hp": 65 })))
        .with_status(204)
        .create_async()
        .await;

    let reconciler = HttpReconciler::new(&server.url(), None).unwrap();
    reconciler.persist_hp(65).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn loads_stats() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/focus/stats")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sessionsCompleted": 7, "totalFocusTime": 12600, "currentStreak": 3}"#)
        .create_async()
        .await;

    let reconciler = HttpReconciler::new(&server.url(), None).unwrap();
    let stats = reconciler.load_stats().await.unwrap();
    assert_eq!(stats.sessions_completed, 7);
    assert_eq!(stats.total_focus_secs, 12_600);
    assert_eq!(stats.current_streak, 3);
}

#[tokio::test]
async fn missing_stats_fields_default_to_zero() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/focus/stats")
        .with_status(200)
        .with_body(r#"{"sessionsCompleted": 2}"#)
        .create_async()
        .await;

    let reconciler = HttpReconciler::new(&server.url(), None).unwrap();
    let stats = reconciler.load_stats().await.unwrap();
    assert_eq!(stats.sessions_completed, 2);
    assert_eq!(stats.total_focus_secs, 0);
    assert_eq!(stats.current_streak, 0);
}

#[tokio::test]
async fn server_errors_surface_as_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/focus/sessions")
        .with_status(500)
        .with_body("ledger offline")
        .create_async()
        .await;

    let reconciler = HttpReconciler::new(&server.url(), None).unwrap();
    let err = reconciler
        .record_outcome(&completed_deep_work())
        .await
        .unwrap_err();
    match err {
        ReconcileError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "ledger offline");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}
