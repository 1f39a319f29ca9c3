//! Recommendation and sentiment proxy

mod common;

use axum::http::StatusCode;
use common::{TestApp, json_request};
use serde_json::json;

#[tokio::test]
async fn test_proxy_requires_login() {
    let app = TestApp::new();

    let recommend = app
        .send(json_request(
            "POST",
            "/api/recommendations",
            json!({"likedAlbums": ["Blue Train"], "reviews": []}),
            None,
        ))
        .await;
    assert_eq!(recommend.status, StatusCode::UNAUTHORIZED);

    let analyze = app
        .send(json_request(
            "POST",
            "/api/analyze-review",
            json!({"review": "Loved it"}),
            None,
        ))
        .await;
    assert_eq!(analyze.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recommendations_pass_through_model_output() {
    let app = TestApp::new();
    let cookie = app.register("alice", "pw1").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/recommendations",
            json!({"likedAlbums": ["Blue Train", "Giant Steps"], "reviews": ["Great sax"]}),
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "recommendations": ["A Love Supreme"],
            "explanation": "Because you liked Blue Train, Giant Steps"
        })
    );
}

#[tokio::test]
async fn test_recommendations_need_liked_albums() {
    let app = TestApp::new();
    let cookie = app.register("alice", "pw1").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/recommendations",
            json!({"likedAlbums": [], "reviews": []}),
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "likedAlbums");
}

#[tokio::test]
async fn test_sentiment_is_clamped() {
    let app = TestApp::new();
    let cookie = app.register("alice", "pw1").await;

    for (raw, expected) in [
        ((4.4, 0.7), json!({"rating": 4, "confidence": 0.7})),
        ((11.0, 3.0), json!({"rating": 5, "confidence": 1.0})),
        ((-3.0, -1.0), json!({"rating": 1, "confidence": 0.0})),
    ] {
        *app.engine.raw_sentiment.lock().unwrap() = raw;

        let response = app
            .send(json_request(
                "POST",
                "/api/analyze-review",
                json!({"review": "A fine record"}),
                Some(&cookie),
            ))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, expected);
    }
}

#[tokio::test]
async fn test_model_failure_is_opaque() {
    let app = TestApp::new();
    let cookie = app.register("alice", "pw1").await;
    *app.engine.fail.lock().unwrap() = true;

    let response = app
        .send(json_request(
            "POST",
            "/api/recommendations",
            json!({"likedAlbums": ["Blue Train"]}),
            Some(&cookie),
        ))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!({"message": "Internal server error"}));

    let response = app
        .send(json_request(
            "POST",
            "/api/analyze-review",
            json!({"review": "A fine record"}),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
