use crate::config::ApiKey;
use crate::language::resolve_provider_code;
use crate::translate::http::{self, build_client, read_json, transport_error};
use crate::translate::{TranslateError, TranslationRequest, TranslationResponse, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use url::Url;

pub const PROVIDER_ID: &str = "google";
const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const LOG_TARGET: &str = "translate::google";

/// Google Cloud Translation (v2, API-key auth).
pub struct GoogleTranslator {
    client: Client,
    api_key: ApiKey,
    base_url: String,
    timeout: Duration,
}

impl GoogleTranslator {
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self, TranslateError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> Result<Url, TranslateError> {
        Url::parse_with_params(&self.base_url, [("key", self.api_key.expose())]).map_err(|e| {
            TranslateError::Provider {
                provider: PROVIDER_ID.to_owned(),
                status: None,
                message: format!("invalid base url '{}': {e}", self.base_url),
            }
        })
    }
}

#[derive(Serialize)]
struct GoogleRequest<'a> {
    q: &'a str,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    format: &'static str,
}

#[derive(Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
    detected_source_language: Option<String>,
}

impl Translator for GoogleTranslator {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<TranslationResponse, TranslateError>> {
        async move {
            let target = resolve_provider_code(request.target(), PROVIDER_ID);
            let body = GoogleRequest {
                q: request.text(),
                target: target.clone(),
                source: request
                    .source()
                    .map(|l| resolve_provider_code(l, PROVIDER_ID)),
                format: "text",
            };
            let url = self.endpoint()?;

            tracing::debug!(target: LOG_TARGET, %target, "sending request");
            let started = Instant::now();
            let response = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER_ID, self.timeout, e))?;

            let (payload, latency_ms): (GoogleResponse, u64) =
                read_json(PROVIDER_ID, self.timeout, started, response).await?;

            let translation = payload
                .data
                .translations
                .into_iter()
                .next()
                .ok_or_else(|| http::malformed(PROVIDER_ID, "no translations in response"))?;

            let mut metadata = BTreeMap::new();
            metadata.insert("target_code".to_owned(), json!(target));
            if let Some(detected) = &translation.detected_source_language {
                metadata.insert("detected_source_language".to_owned(), json!(detected));
            }

            Ok(TranslationResponse {
                source_language: request
                    .source_label(translation.detected_source_language.as_deref()),
                text: translation.translated_text,
                target_language: request.target(),
                provider: PROVIDER_ID.to_owned(),
                model: None,
                latency_ms,
                metadata,
            })
        }
        .boxed()
    }
}
