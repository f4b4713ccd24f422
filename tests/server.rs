#![cfg(feature = "server")]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use chorus::{ChatService, Settings};

fn no_env(_: &str) -> Option<String> {
    None
}

fn app() -> axum::Router {
    let settings = Settings::parse("[fallback]\nseed = 5\n", &no_env).unwrap();
    chorus::http::router(Arc::new(ChatService::from_settings(&settings).unwrap()))
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_returns_answer_and_source() {
    let response = app()
        .oneshot(post_chat(json!({
            "message": "What is 25 + 37?",
            "history": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "Hello!" }
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["response"], "The answer is 62.");
    assert_eq!(body["source"]["kind"], "fallback");
}

#[tokio::test]
async fn blank_message_is_400() {
    let response = app()
        .oneshot(post_chat(json!({ "message": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "message must not be empty");
}

#[tokio::test]
async fn health_says_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
