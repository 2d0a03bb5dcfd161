use crate::config::ApiKey;
use crate::translate::http::{self, build_client, read_json, transport_error};
use crate::translate::prompt::{clean_reply, system_prompt, GENERATIVE_TEMPERATURE, MAX_OUTPUT_TOKENS};
use crate::translate::{TranslateError, TranslationRequest, TranslationResponse, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const PROVIDER_ID: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const LOG_TARGET: &str = "translate::openai";

/// Chat-completions translator. Works against any OpenAI-compatible server
/// via [`OpenAiTranslator::with_base_url`].
pub struct OpenAiTranslator {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiTranslator {
    pub fn new(
        api_key: ApiKey,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl Translator for OpenAiTranslator {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<TranslationResponse, TranslateError>> {
        async move {
            let instruction = system_prompt(request.target(), request.source());
            let body = ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: &instruction,
                    },
                    ChatMessage {
                        role: "user",
                        content: request.text(),
                    },
                ],
                temperature: GENERATIVE_TEMPERATURE,
                max_tokens: MAX_OUTPUT_TOKENS,
            };
            let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

            tracing::debug!(target: LOG_TARGET, model = %self.model, "sending request");
            let started = Instant::now();
            let response = self
                .client
                .post(&url)
                .bearer_auth(self.api_key.expose())
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER_ID, self.timeout, e))?;

            let (payload, latency_ms): (ChatResponse, u64) =
                read_json(PROVIDER_ID, self.timeout, started, response).await?;

            let choice = payload
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| http::malformed(PROVIDER_ID, "no choices in response"))?;
            let text = choice
                .message
                .content
                .as_deref()
                .map(clean_reply)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| http::malformed(PROVIDER_ID, "empty message content"))?;

            let mut metadata = BTreeMap::new();
            if let Some(reason) = choice.finish_reason {
                metadata.insert("finish_reason".to_owned(), json!(reason));
            }
            if let Some(served) = payload.model {
                metadata.insert("served_model".to_owned(), json!(served));
            }
            if let Some(usage) = payload.usage {
                metadata.insert("prompt_tokens".to_owned(), json!(usage.prompt_tokens));
                metadata.insert("completion_tokens".to_owned(), json!(usage.completion_tokens));
                metadata.insert("total_tokens".to_owned(), json!(usage.total_tokens));
            }

            Ok(TranslationResponse {
                text,
                source_language: request.source_label(None),
                target_language: request.target(),
                provider: PROVIDER_ID.to_owned(),
                model: Some(self.model.clone()),
                latency_ms,
                metadata,
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::normalize;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, model: Option<&str>) -> OpenAiTranslator {
        OpenAiTranslator::new(
            ApiKey::new("sk-test").expect("key"),
            model.map(str::to_owned),
            Duration::from_secs(5),
        )
        .expect("client")
        .with_base_url(server.uri())
    }

    fn request() -> TranslationRequest {
        TranslationRequest::new("Hello world", normalize("french").expect("known")).expect("valid")
    }

    #[tokio::test]
    async fn sends_chat_completion_and_extracts_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4", "temperature": 0.3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4-0613",
                "choices": [{
                    "message": { "role": "assistant", "content": " \"Bonjour le monde\"\n" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 30, "completion_tokens": 4, "total_tokens": 34 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, Some("gpt-4"));
        assert_eq!(adapter.model(), Some("gpt-4"));
        let response = adapter.translate(request()).await.expect("translated");

        assert_eq!(response.text, "Bonjour le monde");
        assert_eq!(response.model.as_deref(), Some("gpt-4"));
        assert_eq!(response.source_language, "auto");
        assert_eq!(response.metadata["total_tokens"], json!(34));
        assert_eq!(response.metadata["finish_reason"], json!("stop"));
    }

    #[tokio::test]
    async fn default_model_is_used_without_selector_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": DEFAULT_MODEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Bonjour" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = adapter(&server, None)
            .translate(request())
            .await
            .expect("translated");
        assert_eq!(response.model.as_deref(), Some(DEFAULT_MODEL));
    }

    #[tokio::test]
    async fn unknown_model_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "The model `gpt-99` does not exist" }
            })))
            .mount(&server)
            .await;

        let err = adapter(&server, Some("gpt-99"))
            .translate(request())
            .await
            .expect_err("missing model");
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("gpt-99"));
    }

    #[tokio::test]
    async fn empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": null } }]
            })))
            .mount(&server)
            .await;

        let err = adapter(&server, None)
            .translate(request())
            .await
            .expect_err("empty");
        assert!(err.to_string().contains("empty message content"));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let adapter = OpenAiTranslator::new(
            ApiKey::new("sk-test").expect("key"),
            None,
            Duration::from_millis(200),
        )
        .expect("client")
        .with_base_url(server.uri());

        let err = adapter.translate(request()).await.expect_err("timeout");
        assert!(matches!(err, TranslateError::Timeout { .. }), "{err:?}");
    }
}
