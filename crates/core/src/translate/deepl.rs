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

pub const PROVIDER_ID: &str = "deepl";
const FREE_BASE_URL: &str = "https://api-free.deepl.com/v2";
const PRO_BASE_URL: &str = "https://api.deepl.com/v2";
const LOG_TARGET: &str = "translate::deepl";

pub struct DeepLTranslator {
    client: Client,
    api_key: ApiKey,
    base_url: String,
    timeout: Duration,
}

impl DeepLTranslator {
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self, TranslateError> {
        // Free-tier keys carry a ":fx" suffix and live on a separate host.
        let base_url = if api_key.expose().ends_with(":fx") {
            FREE_BASE_URL
        } else {
            PRO_BASE_URL
        };
        Ok(Self {
            client: build_client(PROVIDER_ID, timeout)?,
            api_key,
            base_url: base_url.to_owned(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct DeepLRequest<'a> {
    text: [&'a str; 1],
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    detected_source_language: Option<String>,
    text: String,
}

impl Translator for DeepLTranslator {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<TranslationResponse, TranslateError>> {
        async move {
            let target_lang = resolve_provider_code(request.target(), PROVIDER_ID);
            // Source codes never take a regional variant.
            let source_lang = request.source().map(|l| l.code().to_uppercase());

            let body = DeepLRequest {
                text: [request.text()],
                target_lang: target_lang.clone(),
                source_lang,
            };
            let url = format!("{}/translate", self.base_url.trim_end_matches('/'));

            tracing::debug!(target: LOG_TARGET, %url, %target_lang, "sending request");
            let started = Instant::now();
            let response = self
                .client
                .post(&url)
                .header(
                    "Authorization",
                    format!("DeepL-Auth-Key {}", self.api_key.expose()),
                )
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER_ID, self.timeout, e))?;

            let (payload, latency_ms): (DeepLResponse, u64) =
                read_json(PROVIDER_ID, self.timeout, started, response).await?;

            let translation = payload
                .translations
                .into_iter()
                .next()
                .ok_or_else(|| http::malformed(PROVIDER_ID, "no translations in response"))?;

            let mut metadata = BTreeMap::new();
            metadata.insert("target_code".to_owned(), json!(target_lang));
            if let Some(detected) = &translation.detected_source_language {
                metadata.insert("detected_source_language".to_owned(), json!(detected));
            }

            Ok(TranslationResponse {
                source_language: request
                    .source_label(translation.detected_source_language.as_deref()),
                text: translation.text,
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
