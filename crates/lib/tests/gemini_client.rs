//! GeminiClient against a local stub: request shape, reply extraction, and fallbacks.

mod common;

use axum::http::StatusCode;
use common::{free_port, gemini_body, spawn_stub, spawn_stub_with_delay};
use lib::llm::{FallbackReason, GeminiClient, Generation, GenerationBackend};
use std::time::Duration;

fn client(base: &str, timeout: Option<Duration>) -> GeminiClient {
    GeminiClient::new(
        Some(format!("{}/v1beta/models", base)),
        None,
        "secret-key".to_string(),
        timeout,
    )
    .expect("build client")
}

#[tokio::test]
async fn sends_single_turn_request_with_key_in_url() {
    let stub = spawn_stub(|_| (StatusCode::OK, gemini_body("hi there"))).await;
    let out = client(&stub.base_url, None).generate("full prompt").await;
    assert_eq!(out, Generation::Reply("hi there".to_string()));

    let reqs = stub.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].path, "/v1beta/models/gemini-2.0-flash:generateContent");
    assert_eq!(reqs[0].query.as_deref(), Some("key=secret-key"));
    assert!(reqs[0]
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("application/json"));
    assert_eq!(
        reqs[0].body,
        serde_json::json!({ "contents": [{ "role": "user", "parts": [{ "text": "full prompt" }] }] })
    );
}

#[tokio::test]
async fn missing_candidate_is_no_content() {
    let stub = spawn_stub(|_| {
        (
            StatusCode::OK,
            r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#.to_string(),
        )
    })
    .await;
    let out = client(&stub.base_url, None).generate("p").await;
    assert_eq!(out, Generation::Fallback(FallbackReason::NoContent));
}

#[tokio::test]
async fn non_json_success_body_is_no_content() {
    let stub = spawn_stub(|_| (StatusCode::OK, "<html>hello</html>".to_string())).await;
    let out = client(&stub.base_url, None).generate("p").await;
    assert_eq!(out, Generation::Fallback(FallbackReason::NoContent));
}

#[tokio::test]
async fn error_status_is_request_failed() {
    for status in [
        StatusCode::BAD_REQUEST,
        StatusCode::FORBIDDEN,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::INTERNAL_SERVER_ERROR,
    ] {
        let stub = spawn_stub(move |_| {
            (
                status,
                r#"{"error":{"code":400,"message":"API key not valid"}}"#.to_string(),
            )
        })
        .await;
        let out = client(&stub.base_url, None).generate("p").await;
        assert_eq!(out, Generation::Fallback(FallbackReason::RequestFailed), "status {}", status);
    }
}

#[tokio::test]
async fn connection_refused_is_request_failed() {
    let base = format!("http://127.0.0.1:{}", free_port());
    let out = client(&base, None).generate("p").await;
    assert_eq!(out, Generation::Fallback(FallbackReason::RequestFailed));
}

#[tokio::test]
async fn slow_upstream_times_out_as_request_failed() {
    let stub = spawn_stub_with_delay(|_| (StatusCode::OK, gemini_body("late")), Duration::from_secs(3)).await;
    let out = client(&stub.base_url, Some(Duration::from_millis(300)))
        .generate("p")
        .await;
    assert_eq!(out, Generation::Fallback(FallbackReason::RequestFailed));
}

#[tokio::test]
async fn transport_errors_do_not_reveal_api_key() {
    let base = format!("http://127.0.0.1:{}", free_port());
    let err = client(&base, None)
        .generate_content("p")
        .await
        .expect_err("closed port must fail");
    let shown = format!("{} / {:?}", err, err);
    assert!(!shown.contains("secret-key"), "key leaked: {}", shown);

    let stub = spawn_stub_with_delay(|_| (StatusCode::OK, gemini_body("late")), Duration::from_secs(3)).await;
    let err = client(&stub.base_url, Some(Duration::from_millis(200)))
        .generate_content("p")
        .await
        .expect_err("timeout must fail");
    let shown = format!("{} / {:?}", err, err);
    assert!(!shown.contains("secret-key"), "key leaked: {}", shown);
}
