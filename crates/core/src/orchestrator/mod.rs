//! Single-provider translation and multi-provider comparison.
//!
//! Every call instantiates fresh adapters from the registry and drops them
//! before returning, whatever the outcome.

mod comparison;

use crate::config::{Config, ConfigError};
use crate::language;
use crate::provider::{ProviderRegistry, ProviderSelector};
use crate::translate::{
    blocking_runtime, ProviderFailure, TranslateError, TranslationRequest, TranslationResponse,
    Translator,
};
use futures::future::join_all;
use std::sync::Arc;

pub use comparison::ComparisonResult;

const LOG_TARGET: &str = "orchestrator";

type Slot = (String, Result<Box<dyn Translator>, TranslateError>);
type Outcome = (String, Result<TranslationResponse, TranslateError>);

#[derive(Clone, Debug)]
pub struct Orchestrator {
    config: Arc<Config>,
    registry: Arc<ProviderRegistry>,
}

impl Orchestrator {
    /// Uses the built-in providers.
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, ProviderRegistry::builtin())
    }

    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Registered providers holding a credential, in configuration order.
    pub fn list_configured_providers(&self) -> Vec<String> {
        let mut configured: Vec<String> = Vec::new();
        for provider in self.config.credential_providers() {
            if self.registry.contains(provider) && !configured.iter().any(|p| p == provider) {
                configured.push(provider.to_owned());
            }
        }
        configured
    }

    /// Translates with one provider. Without `provider`, the first configured
    /// one is used.
    pub async fn translate_async(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
        provider: Option<&str>,
    ) -> Result<TranslationResponse, TranslateError> {
        let request = self.request(text, target, source)?;
        let selector = self.selector(provider)?;
        let adapter = self.registry.create(&selector, &self.config)?;
        let outcome = self.invoke(adapter.as_ref(), request).await;
        release(adapter);
        outcome
    }

    /// Blocking form of [`Orchestrator::translate_async`]. Inside a tokio
    /// runtime this fails with [`TranslateError::NestedRuntime`] before any
    /// adapter is built.
    pub fn translate(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
        provider: Option<&str>,
    ) -> Result<TranslationResponse, TranslateError> {
        let request = self.request(text, target, source)?;
        let selector = self.selector(provider)?;
        let runtime = blocking_runtime()?;
        let adapter = self.registry.create(&selector, &self.config)?;
        let outcome = runtime.block_on(self.invoke(adapter.as_ref(), request));
        release(adapter);
        outcome
    }

    /// Sends the same request to every provider at once. Results keep the
    /// order of `providers`; failed providers are left out unless all of
    /// them failed.
    pub async fn compare_async<S: AsRef<str>>(
        &self,
        text: &str,
        target: &str,
        providers: &[S],
    ) -> Result<ComparisonResult, TranslateError> {
        let (request, slots) = self.prepare_comparison(text, target, providers)?;
        let calls = slots.into_iter().map(|(label, slot)| {
            let request = request.clone();
            async move {
                let outcome = match slot {
                    Ok(adapter) => {
                        let outcome = self.invoke(adapter.as_ref(), request).await;
                        release(adapter);
                        outcome
                    }
                    Err(error) => Err(error),
                };
                (label, outcome)
            }
        });
        let outcomes = join_all(calls).await;
        aggregate(request, outcomes)
    }

    /// Blocking form of [`Orchestrator::compare_async`]. Providers are
    /// called one after another.
    pub fn compare<S: AsRef<str>>(
        &self,
        text: &str,
        target: &str,
        providers: &[S],
    ) -> Result<ComparisonResult, TranslateError> {
        let (request, slots) = self.prepare_comparison(text, target, providers)?;
        let runtime = blocking_runtime()?;
        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .map(|(label, slot)| {
                let outcome = match slot {
                    Ok(adapter) => {
                        let outcome = runtime.block_on(self.invoke(adapter.as_ref(), request.clone()));
                        release(adapter);
                        outcome
                    }
                    Err(error) => Err(error),
                };
                (label, outcome)
            })
            .collect();
        aggregate(request, outcomes)
    }

    fn request(
        &self,
        text: &str,
        target: &str,
        source: Option<&str>,
    ) -> Result<TranslationRequest, TranslateError> {
        let target = language::normalize(target)?;
        let source = match source {
            Some(raw) => language::normalize_source(raw)?,
            None => None,
        };
        Ok(TranslationRequest::new(text, target)?.with_source(source))
    }

    fn selector(&self, provider: Option<&str>) -> Result<ProviderSelector, TranslateError> {
        match provider {
            Some(raw) => ProviderSelector::parse(raw),
            None => self
                .list_configured_providers()
                .into_iter()
                .next()
                .map(|provider| ProviderSelector {
                    provider,
                    model: None,
                })
                .ok_or_else(|| ConfigError::NoProviderConfigured.into()),
        }
    }

    /// Builds every adapter up front. Selectors that fail to parse or
    /// instantiate become failed slots instead of aborting the comparison.
    fn prepare_comparison<S: AsRef<str>>(
        &self,
        text: &str,
        target: &str,
        providers: &[S],
    ) -> Result<(TranslationRequest, Vec<Slot>), TranslateError> {
        if providers.is_empty() {
            return Err(TranslateError::EmptyProviderList);
        }
        let request = self.request(text, target, None)?;
        let slots = providers
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                match ProviderSelector::parse(raw) {
                    Ok(selector) => (
                        selector.to_string(),
                        self.registry.create(&selector, &self.config),
                    ),
                    Err(error) => (raw.trim().to_owned(), Err(error)),
                }
            })
            .collect();
        Ok((request, slots))
    }

    async fn invoke(
        &self,
        adapter: &dyn Translator,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, TranslateError> {
        let timeout = self.config.timeout();
        tracing::debug!(
            target: LOG_TARGET,
            provider = adapter.id(),
            model = adapter.model(),
            target_language = %request.target(),
            "dispatching translation"
        );
        match tokio::time::timeout(timeout, adapter.translate(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TranslateError::Timeout {
                provider: adapter.id().to_owned(),
                after: timeout,
            }),
        }
    }
}

fn release(adapter: Box<dyn Translator>) {
    tracing::trace!(target: LOG_TARGET, provider = adapter.id(), "releasing adapter");
    drop(adapter);
}

fn aggregate(
    request: TranslationRequest,
    outcomes: Vec<Outcome>,
) -> Result<ComparisonResult, TranslateError> {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (provider, outcome) in outcomes {
        match outcome {
            Ok(response) => results.push(response),
            Err(error) => {
                tracing::warn!(target: LOG_TARGET, %provider, %error, "provider left out of comparison");
                failures.push(ProviderFailure { provider, error });
            }
        }
    }
    if results.is_empty() {
        return Err(TranslateError::AllProvidersFailed(failures));
    }
    Ok(ComparisonResult { request, results })
}
