//! Abuse report intake over HTTP.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use domains::ReportReason;
use serde_json::json;

#[tokio::test]
async fn valid_reports_are_stored() {
    let app = TestApp::new();
    let post = app.create_post("alice", "questionable", "general").await;

    let (status, body) = app
        .post(
            "/reports",
            "bob",
            json!({ "postId": post, "reason": "hate_speech", "description": "  rude  " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Report submitted. Thank you for helping keep the community safe."
    );

    let reports = app.store.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, ReportReason::HateSpeech);
    assert_eq!(reports[0].reporter_id.as_str(), "bob");
    assert_eq!(reports[0].description, "rude");
    assert_eq!(reports[0].post_id.map(|id| id.to_string()), Some(post));
}

#[tokio::test]
async fn comments_can_be_reported_too() {
    let app = TestApp::new();
    let post = app.create_post("alice", "fine", "general").await;
    let comment = app.create_comment("bob", &post, "not fine", None).await;

    let (status, _) = app
        .post("/api/reports", "carol", json!({ "commentId": comment, "reason": "spam" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(app.store.reports()[0].post_id.is_none());
}

#[tokio::test]
async fn incomplete_reports_are_rejected() {
    let app = TestApp::new();
    let post = app.create_post("alice", "fine", "general").await;

    let cases = [
        (json!({ "reason": "spam" }), "Must specify post or comment to report"),
        (json!({ "postId": post }), "Reason is required"),
        (json!({ "postId": post, "reason": "boring" }), "Invalid report reason"),
        (json!({ "postId": "zzz", "reason": "spam" }), "Invalid post id"),
    ];
    for (body, message) in cases {
        let (status, res) = app.post("/reports", "bob", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["message"], message);
    }
    assert!(app.store.reports().is_empty());

    let (status, _) = app
        .send(
            axum::http::Method::POST,
            "/reports",
            None,
            Some(json!({ "postId": post, "reason": "spam" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
