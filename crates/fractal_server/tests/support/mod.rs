#![allow(dead_code)]

use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
use fractal_server::{LlmConfig, ServerConfig, StartedServer};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct StubLlm {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Local stand-in for the chat completions API answering every request with
/// `status` and `body`.
pub async fn start_stub_llm(status: StatusCode, body: Value) -> StubLlm {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(req): Json<Value>| {
            let recorded = recorded.clone();
            let body = body.clone();
            async move {
                recorded.lock().unwrap().push(RecordedRequest {
                    authorization: headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned),
                    body: req,
                });
                (status, Json(body))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubLlm {
        base_url: format!("http://{addr}/v1"),
        requests,
        _handle: handle,
    }
}

pub fn test_config(dir: &Path, api_key: Option<&str>, base_url: &str) -> ServerConfig {
    ServerConfig {
        addr: "127.0.0.1:0".parse().unwrap(),
        db_path: dir.join("fractal.db"),
        web_dist_dir: dir.join("web"),
        llm: LlmConfig {
            api_key: api_key.map(str::to_owned),
            base_url: base_url.to_owned(),
            model: "test-model".to_owned(),
        },
    }
}

pub async fn start(config: ServerConfig) -> StartedServer {
    fractal_server::start_server_with_config(config).await.unwrap()
}

pub const PASSWORD: &str = "correct horse";

/// `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(res: &reqwest::Response) -> String {
    res.headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default()
        .to_owned()
}

pub async fn post_auth(addr: SocketAddr, path: &str, email: &str, password: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/{path}"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

/// Registers `email` and returns the session cookie for it.
pub async fn signup(addr: SocketAddr, email: &str) -> String {
    let res = post_auth(addr, "signup", email, PASSWORD).await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    session_cookie(&res)
}

pub async fn login(addr: SocketAddr, email: &str) -> String {
    let res = post_auth(addr, "login", email, PASSWORD).await;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    session_cookie(&res)
}
