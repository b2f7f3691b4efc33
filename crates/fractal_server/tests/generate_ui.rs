mod support;

use axum::http::StatusCode;
use serde_json::{Value, json};
use support::{signup, start, start_stub_llm, test_config};

async fn post_prompt(addr: std::net::SocketAddr, body: Value) -> (reqwest::StatusCode, Value) {
    let cookie = signup(addr, "gen@example.com").await;
    let res = reqwest::Client::new()
        .post(format!("http://{addr}/api/generate-ui"))
        .header(reqwest::header::COOKIE, cookie)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json::<Value>().await.unwrap())
}

#[tokio::test]
async fn non_post_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(test_config(dir.path(), Some("key"), "http://127.0.0.1:9")).await;

    let cookie = signup(server.addr, "gen@example.com").await;
    let res = reqwest::Client::new()
        .get(format!("http://{}/api/generate-ui", server.addr))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn missing_or_empty_prompt_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(test_config(dir.path(), Some("key"), "http://127.0.0.1:9")).await;

    let cookie = signup(server.addr, "gen@example.com").await;
    for body in [json!({}), json!({ "prompt": "" })] {
        let res = reqwest::Client::new()
            .post(format!("http://{}/api/generate-ui", server.addr))
            .header(reqwest::header::COOKIE, &cookie)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        let body: Value = res.json().await.unwrap();
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Prompt is required" }));
    }
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(StatusCode::OK, json!({})).await;
    let server = start(test_config(dir.path(), None, &stub.base_url)).await;

    let (status, body) = post_prompt(server.addr, json!({ "prompt": "hero" })).await;
    assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "LLM API key not configured" }));
    assert!(stub.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn successful_generation_returns_first_choice() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": "<Hero />" } }] }),
    )
    .await;
    let server = start(test_config(dir.path(), Some("secret"), &stub.base_url)).await;

    let (status, body) = post_prompt(server.addr, json!({ "prompt": "a hero section" })).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, json!({ "code": "<Hero />" }));

    let requests = stub.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(request.body["model"], "test-model");
    assert_eq!(request.body["stream"], false);
    assert_eq!(request.body["max_completion_tokens"], 8192);
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["content"], "a hero section");
}

#[tokio::test]
async fn empty_choices_yield_empty_code() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(StatusCode::OK, json!({ "choices": [] })).await;
    let server = start(test_config(dir.path(), Some("secret"), &stub.base_url)).await;

    let (status, body) = post_prompt(server.addr, json!({ "prompt": "hero" })).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, json!({ "code": "" }));
}

#[tokio::test]
async fn upstream_error_message_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Invalid API key" } }),
    )
    .await;
    let server = start(test_config(dir.path(), Some("wrong"), &stub.base_url)).await;

    let (status, body) = post_prompt(server.addr, json!({ "prompt": "hero" })).await;
    assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Invalid API key" }));
}

#[tokio::test]
async fn upstream_error_without_message_uses_generic_text() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(StatusCode::BAD_GATEWAY, json!({ "status": "down" })).await;
    let server = start(test_config(dir.path(), Some("secret"), &stub.base_url)).await;

    let (status, body) = post_prompt(server.addr, json!({ "prompt": "hero" })).await;
    assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "LLM API error" }));
}

#[tokio::test]
async fn generation_requires_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let stub = start_stub_llm(StatusCode::OK, json!({ "choices": [] })).await;
    let server = start(test_config(dir.path(), Some("secret"), &stub.base_url)).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/api/generate-ui", server.addr))
        .json(&json!({ "prompt": "hero" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert!(stub.requests.lock().unwrap().is_empty());
}
