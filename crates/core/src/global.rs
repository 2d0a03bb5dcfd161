//! Process-wide default configuration behind free functions, for callers
//! that do not want to carry an [`Orchestrator`] around.

use crate::config::{Config, ConfigError};
use crate::language::{self, Language};
use crate::orchestrator::{ComparisonResult, Orchestrator};
use crate::provider::{ProviderInfo, ProviderRegistry};
use crate::translate::{TranslateError, TranslationResponse};
use std::sync::{PoisonError, RwLock};

static DEFAULT_CONFIG: RwLock<Option<Config>> = RwLock::new(None);

/// Merges `entries` into the default configuration. Nothing is applied if
/// any entry is invalid.
pub fn configure<I, K, V>(entries: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut guard = DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let mut config = guard.clone().unwrap_or_default();
    config.extend(entries)?;
    *guard = Some(config);
    Ok(())
}

/// Replaces the default configuration wholesale.
pub fn set_default_config(config: Config) {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(config);
}

/// Forgets everything passed to [`configure`].
pub fn reset() {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn default_config() -> Config {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default()
}

/// An orchestrator over the built-in providers and a snapshot of the
/// default configuration.
pub fn default_orchestrator() -> Orchestrator {
    Orchestrator::new(default_config())
}

pub fn translate(
    text: &str,
    target: &str,
    source: Option<&str>,
    provider: Option<&str>,
) -> Result<TranslationResponse, TranslateError> {
    default_orchestrator().translate(text, target, source, provider)
}

pub async fn translate_async(
    text: &str,
    target: &str,
    source: Option<&str>,
    provider: Option<&str>,
) -> Result<TranslationResponse, TranslateError> {
    default_orchestrator()
        .translate_async(text, target, source, provider)
        .await
}

pub fn compare<S: AsRef<str>>(
    text: &str,
    target: &str,
    providers: &[S],
) -> Result<ComparisonResult, TranslateError> {
    default_orchestrator().compare(text, target, providers)
}

pub async fn compare_async<S: AsRef<str>>(
    text: &str,
    target: &str,
    providers: &[S],
) -> Result<ComparisonResult, TranslateError> {
    default_orchestrator()
        .compare_async(text, target, providers)
        .await
}

pub fn normalize_language(input: &str) -> Result<Language, TranslateError> {
    language::normalize(input)
}

pub fn list_languages() -> Vec<Language> {
    language::list_languages()
}

pub fn list_providers() -> Vec<ProviderInfo> {
    ProviderRegistry::builtin().providers().cloned().collect()
}

pub fn list_configured_providers() -> Vec<String> {
    default_orchestrator().list_configured_providers()
}
