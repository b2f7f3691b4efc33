use crate::LlmConfig;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fractal_api::{ApiError, GenerateUiRequest, GenerateUiResponse};
use fractal_domain::{CodeGenerator, GenerateFuture};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_COMPLETION_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.2;
const TOP_P: f32 = 1.0;

const SYSTEM_PROMPT: &str = "You are a highly skilled UI/UX designer and React developer. \
Your task is to generate clean, modern, and highly modular React components styled with \
Tailwind CSS based on user descriptions. Prioritize atomic design principles and \
Awwwards-level aesthetics.";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GenerateError {
    MissingApiKey,
    /// Non-2xx answer from the upstream API.
    Upstream(String),
    Transport(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => f.write_str("LLM API key not configured"),
            Self::Upstream(message) | Self::Transport(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for GenerateError {}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GenerateError::MissingApiKey);
        };

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: &self.config.model,
            stream: false,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let res = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerateError::Transport(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let parsed = res.json::<UpstreamError>().await.ok();
            let message = parsed
                .and_then(UpstreamError::into_message)
                .unwrap_or_else(|| "LLM API error".to_owned());
            tracing::warn!(status = %status, message = %message, "llm request rejected");
            return Err(GenerateError::Upstream(message));
        }

        let parsed = res
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| GenerateError::Transport(err.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

impl CodeGenerator for LlmClient {
    fn generate(&self, prompt: String) -> GenerateFuture {
        let client = self.clone();
        Box::pin(async move { client.complete(&prompt).await.map_err(|err| err.to_string()) })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    stream: bool,
    max_completion_tokens: u32,
    temperature: f32,
    top_p: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl UpstreamError {
    fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.error.and_then(|detail| detail.message))
            .filter(|message| !message.trim().is_empty())
    }
}

pub(crate) async fn generate_ui(State(client): State<LlmClient>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<GenerateUiRequest>(&body).unwrap_or_default();
    let Some(prompt) = request.prompt.filter(|prompt| !prompt.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Prompt is required");
    };

    match client.complete(&prompt).await {
        Ok(code) => Json(GenerateUiResponse { code }).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "generate-ui failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: error.into(),
        }),
    )
        .into_response()
}
