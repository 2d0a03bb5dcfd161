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

pub const PROVIDER_ID: &str = "anthropic";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const LOG_TARGET: &str = "translate::anthropic";

/// Messages-API translator.
pub struct AnthropicTranslator {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl AnthropicTranslator {
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
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

impl Translator for AnthropicTranslator {
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
            let body = MessagesRequest {
                model: &self.model,
                system: &instruction,
                messages: [Message {
                    role: "user",
                    content: request.text(),
                }],
                max_tokens: MAX_OUTPUT_TOKENS,
                temperature: GENERATIVE_TEMPERATURE,
            };
            let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

            tracing::debug!(target: LOG_TARGET, model = %self.model, "sending request");
            let started = Instant::now();
            let response = self
                .client
                .post(&url)
                .header("x-api-key", self.api_key.expose())
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER_ID, self.timeout, e))?;

            let (payload, latency_ms): (MessagesResponse, u64) =
                read_json(PROVIDER_ID, self.timeout, started, response).await?;

            let text = payload
                .content
                .iter()
                .find(|block| block.kind == "text")
                .and_then(|block| block.text.as_deref())
                .map(clean_reply)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| http::malformed(PROVIDER_ID, "no text content in response"))?;

            let mut metadata = BTreeMap::new();
            if let Some(reason) = payload.stop_reason {
                metadata.insert("stop_reason".to_owned(), json!(reason));
            }
            if let Some(usage) = payload.usage {
                metadata.insert("input_tokens".to_owned(), json!(usage.input_tokens));
                metadata.insert("output_tokens".to_owned(), json!(usage.output_tokens));
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

    fn adapter(server: &MockServer) -> AnthropicTranslator {
        AnthropicTranslator::new(
            ApiKey::new("ak-test").expect("key"),
            Some("claude-3-5-sonnet-20241022".to_owned()),
            Duration::from_secs(5),
        )
        .expect("client")
        .with_base_url(server.uri())
    }

    fn request() -> TranslationRequest {
        TranslationRequest::new("Good morning", normalize("german").expect("known"))
            .expect("valid")
            .with_source(Some(normalize("english").expect("known")))
    }

    #[tokio::test]
    async fn sends_messages_request_and_extracts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-3-5-sonnet-20241022",
                "messages": [{ "role": "user", "content": "Good morning" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "Guten Morgen" }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 25, "output_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = adapter(&server).translate(request()).await.expect("translated");
        assert_eq!(response.text, "Guten Morgen");
        assert_eq!(response.source_language, "english");
        assert_eq!(response.target_language.name(), "german");
        assert_eq!(response.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
        assert_eq!(response.metadata["output_tokens"], json!(5));
    }

    #[tokio::test]
    async fn overloaded_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = adapter(&server).translate(request()).await.expect_err("overloaded");
        assert_eq!(err.status(), Some(529));
        assert_eq!(err.provider(), Some(PROVIDER_ID));
    }

    #[tokio::test]
    async fn missing_text_block_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "tool_use" }]
            })))
            .mount(&server)
            .await;

        let err = adapter(&server).translate(request()).await.expect_err("malformed");
        assert!(err.to_string().contains("no text content"));
    }
}
