mod anthropic;
mod deepl;
mod google;
mod http;
mod openai;
mod prompt;

use crate::config::ConfigError;
use crate::language::{self, Language, AUTO};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub use anthropic::{AnthropicTranslator, DEFAULT_MODEL as ANTHROPIC_DEFAULT_MODEL};
pub use deepl::DeepLTranslator;
pub use google::GoogleTranslator;
pub use openai::{OpenAiTranslator, DEFAULT_MODEL as OPENAI_DEFAULT_MODEL};
pub use prompt::{system_prompt, GENERATIVE_TEMPERATURE};

/// Metadata key holding an optional `0.0..=1.0` confidence score.
pub const CONFIDENCE_KEY: &str = "confidence";

/// What to translate. Text is never blank; languages are already canonical.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    target: Language,
    source: Option<Language>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: Language) -> Result<Self, TranslateError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        Ok(Self {
            text,
            target,
            source: None,
        })
    }

    /// `None` lets the provider detect the source language.
    pub fn with_source(mut self, source: Option<Language>) -> Self {
        self.source = source;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn target(&self) -> Language {
        self.target
    }

    pub fn source(&self) -> Option<Language> {
        self.source
    }

    /// The source language to report back: the requested one, else whatever
    /// the provider detected, else [`AUTO`].
    pub(crate) fn source_label(&self, detected: Option<&str>) -> String {
        if let Some(source) = self.source {
            return source.name().to_owned();
        }
        match detected {
            Some(raw) => language::lookup(raw)
                .map(|l| l.name().to_owned())
                .unwrap_or_else(|| raw.trim().to_lowercase()),
            None => AUTO.to_owned(),
        }
    }
}

/// One successful provider answer.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TranslationResponse {
    pub text: String,
    pub source_language: String,
    pub target_language: Language,
    pub provider: String,
    pub model: Option<String>,
    pub latency_ms: u64,
    pub metadata: BTreeMap<String, Value>,
}

impl TranslationResponse {
    pub fn confidence(&self) -> Option<f64> {
        self.metadata.get(CONFIDENCE_KEY).and_then(Value::as_f64)
    }
}

/// A provider that failed inside a comparison.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: TranslateError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("text to translate must not be empty")]
    EmptyText,
    #[error("language '{input}' is not supported{}", suggestion_hint(.suggestions))]
    LanguageNotSupported {
        input: String,
        suggestions: Vec<String>,
    },
    #[error("invalid provider selector '{0}'")]
    InvalidSelector(String),
    #[error("unknown provider '{name}' (available: {})", .available.join(", "))]
    UnknownProvider { name: String, available: Vec<String> },
    #[error("at least one provider is required for a comparison")]
    EmptyProviderList,
    #[error("{provider} request failed{}: {message}", status_hint(.status))]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },
    #[error("{provider} rate limit or quota exceeded{}", retry_hint(.retry_after))]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },
    #[error("{provider} did not answer within {after:?}")]
    Timeout { provider: String, after: Duration },
    #[error("all providers failed: {}", failure_list(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),
    #[error("failed to start blocking runtime")]
    Runtime(#[source] std::io::Error),
    #[error("blocking call made from inside an async runtime; use the async form")]
    NestedRuntime,
}

impl TranslateError {
    /// The provider a failure belongs to, when it came from one.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Provider { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider, .. } => Some(provider),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

fn suggestion_hint(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean: {}?", suggestions.join(", "))
    }
}

fn status_hint(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!("; retry after {}s", d.as_secs()))
        .unwrap_or_default()
}

fn failure_list(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One back end behind the uniform translate contract.
///
/// Implementations perform exactly one request per call and report latency
/// from dispatch to full receipt of the body. Each instance owns its own
/// connection pool, released when the instance is dropped.
pub trait Translator: Send + Sync {
    fn id(&self) -> &str;

    fn model(&self) -> Option<&str> {
        None
    }

    fn translate(
        &self,
        request: TranslationRequest,
    ) -> BoxFuture<'_, Result<TranslationResponse, TranslateError>>;

    /// Drives [`Translator::translate`] to completion on a private
    /// current-thread runtime. Inside a tokio runtime this fails with
    /// [`TranslateError::NestedRuntime`].
    fn translate_blocking(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, TranslateError> {
        blocking_runtime()?.block_on(self.translate(request))
    }
}

pub(crate) fn blocking_runtime() -> Result<tokio::runtime::Runtime, TranslateError> {
    // block_on panics when nested inside another runtime.
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(TranslateError::NestedRuntime);
    }
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(TranslateError::Runtime)
}
