use crate::config::{ApiKey, Config};
use crate::provider::selector::{ProviderSelector, PROVIDER_ALIASES};
use crate::translate::{
    AnthropicTranslator, DeepLTranslator, GoogleTranslator, OpenAiTranslator, TranslateError,
    Translator, ANTHROPIC_DEFAULT_MODEL, OPENAI_DEFAULT_MODEL,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const LOG_TARGET: &str = "provider::registry";

/// How a back end produces translations. Callers see the same contract
/// either way.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Text and target code in, translated text out.
    Api,
    /// A prompted chat/completion model.
    Generative,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ProviderKind,
    pub default_model: Option<String>,
    /// Models known at release time. Advisory only: other names are still
    /// sent to the API.
    pub known_models: Vec<String>,
    pub requires_api_key: bool,
}

impl ProviderInfo {
    pub fn new(id: impl Into<String>, kind: ProviderKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            kind,
            default_model: None,
            known_models: Vec::new(),
            requires_api_key: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_models(mut self, default_model: &str, known: &[&str]) -> Self {
        self.default_model = Some(default_model.to_owned());
        self.known_models = known.iter().map(|m| (*m).to_owned()).collect();
        self
    }

    pub fn requires_api_key(mut self, required: bool) -> Self {
        self.requires_api_key = required;
        self
    }
}

/// Everything an adapter factory gets to build one instance.
#[derive(Clone, Debug)]
pub struct AdapterSettings {
    pub provider: String,
    pub api_key: Option<ApiKey>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl AdapterSettings {
    pub fn require_api_key(&self) -> Result<ApiKey, TranslateError> {
        self.api_key.clone().ok_or_else(|| {
            crate::config::ConfigError::MissingCredential {
                provider: self.provider.clone(),
                key: crate::config::api_key_name(&self.provider),
            }
            .into()
        })
    }
}

pub type AdapterFactory =
    Arc<dyn Fn(AdapterSettings) -> Result<Box<dyn Translator>, TranslateError> + Send + Sync>;

struct Registration {
    info: ProviderInfo,
    factory: AdapterFactory,
}

/// Known back ends, in registration order.
pub struct ProviderRegistry {
    entries: Vec<Registration>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|r| &r.info.id))
            .finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Google, DeepL, OpenAI and Anthropic.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            ProviderInfo::new("google", ProviderKind::Api)
                .with_name("Google Translate")
                .with_description("Google Cloud Translation API"),
            |settings| {
                let mut adapter =
                    GoogleTranslator::new(settings.require_api_key()?, settings.timeout)?;
                if let Some(url) = settings.base_url {
                    adapter = adapter.with_base_url(url);
                }
                Ok(Box::new(adapter))
            },
        );
        registry.register(
            ProviderInfo::new("deepl", ProviderKind::Api)
                .with_name("DeepL")
                .with_description("DeepL translation API"),
            |settings| {
                let mut adapter =
                    DeepLTranslator::new(settings.require_api_key()?, settings.timeout)?;
                if let Some(url) = settings.base_url {
                    adapter = adapter.with_base_url(url);
                }
                Ok(Box::new(adapter))
            },
        );
        registry.register(
            ProviderInfo::new("openai", ProviderKind::Generative)
                .with_name("OpenAI")
                .with_description("OpenAI chat models")
                .with_models(
                    OPENAI_DEFAULT_MODEL,
                    &[
                        "gpt-4o",
                        "gpt-4o-mini",
                        "gpt-4-turbo",
                        "gpt-4",
                        "gpt-3.5-turbo",
                    ],
                ),
            |settings| {
                let mut adapter = OpenAiTranslator::new(
                    settings.require_api_key()?,
                    settings.model.clone(),
                    settings.timeout,
                )?;
                if let Some(url) = settings.base_url {
                    adapter = adapter.with_base_url(url);
                }
                Ok(Box::new(adapter))
            },
        );
        registry.register(
            ProviderInfo::new("anthropic", ProviderKind::Generative)
                .with_name("Anthropic")
                .with_description("Anthropic Claude models")
                .with_models(
                    ANTHROPIC_DEFAULT_MODEL,
                    &[
                        "claude-3-5-sonnet-20241022",
                        "claude-3-5-haiku-20241022",
                        "claude-3-opus-20240229",
                        "claude-3-sonnet-20240229",
                        "claude-3-haiku-20240307",
                    ],
                ),
            |settings| {
                let mut adapter = AnthropicTranslator::new(
                    settings.require_api_key()?,
                    settings.model.clone(),
                    settings.timeout,
                )?;
                if let Some(url) = settings.base_url {
                    adapter = adapter.with_base_url(url);
                }
                Ok(Box::new(adapter))
            },
        );
        registry
    }

    /// Adds a provider, replacing any earlier one with the same id.
    pub fn register<F>(&mut self, info: ProviderInfo, factory: F)
    where
        F: Fn(AdapterSettings) -> Result<Box<dyn Translator>, TranslateError>
            + Send
            + Sync
            + 'static,
    {
        let registration = Registration {
            info,
            factory: Arc::new(factory),
        };
        match self
            .entries
            .iter_mut()
            .find(|r| r.info.id == registration.info.id)
        {
            Some(slot) => *slot = registration,
            None => self.entries.push(registration),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderInfo> {
        self.entries
            .iter()
            .find(|r| r.info.id == id)
            .map(|r| &r.info)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.entries.iter().map(|r| &r.info)
    }

    /// Builds a fresh adapter for `selector`. Unknown providers fail here;
    /// unknown models only log a warning and are passed through.
    pub fn create(
        &self,
        selector: &ProviderSelector,
        config: &Config,
    ) -> Result<Box<dyn Translator>, TranslateError> {
        let Some(registration) = self
            .entries
            .iter()
            .find(|r| r.info.id == selector.provider)
        else {
            return Err(TranslateError::UnknownProvider {
                name: selector.provider.clone(),
                available: self.available_names(),
            });
        };
        let info = &registration.info;

        let api_key = if info.requires_api_key {
            Some(config.api_key(&info.id)?)
        } else {
            config.api_key(&info.id).ok()
        };

        if let Some(model) = &selector.model {
            match info.kind {
                ProviderKind::Api => tracing::warn!(
                    target: LOG_TARGET,
                    provider = %info.id,
                    %model,
                    "provider does not take a model; ignoring it"
                ),
                ProviderKind::Generative
                    if !info.known_models.is_empty() && !info.known_models.contains(model) =>
                {
                    tracing::warn!(
                        target: LOG_TARGET,
                        provider = %info.id,
                        %model,
                        "model is not in the known list; trying it anyway"
                    )
                }
                ProviderKind::Generative => {}
            }
        }

        let settings = AdapterSettings {
            provider: info.id.clone(),
            api_key,
            model: selector.model.clone(),
            base_url: config.base_url(&info.id).map(str::to_owned),
            timeout: config.timeout(),
        };
        tracing::debug!(target: LOG_TARGET, selector = %selector, "creating adapter");
        (registration.factory)(settings)
    }

    fn available_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|r| r.info.id.clone())
            .chain(
                PROVIDER_ALIASES
                    .iter()
                    .filter(|(_, id)| self.contains(id))
                    .map(|(alias, _)| (*alias).to_owned()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_entries([
            ("openai_api_key", "sk-test"),
            ("deepl_api_key", "dk:fx"),
            ("openai_base_url", "http://localhost:9"),
        ])
        .expect("valid")
    }

    #[test]
    fn builtin_providers_in_order() {
        let registry = ProviderRegistry::builtin();
        let ids: Vec<_> = registry.providers().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["google", "deepl", "openai", "anthropic"]);
        assert_eq!(registry.get("deepl").map(|p| p.kind), Some(ProviderKind::Api));
        assert_eq!(
            registry.get("openai").and_then(|p| p.default_model.as_deref()),
            Some("gpt-4o-mini")
        );
    }

    #[test]
    fn creates_adapter_with_selected_model() {
        let registry = ProviderRegistry::builtin();
        let selector = ProviderSelector::parse("gpt/gpt-4").expect("valid");
        let adapter = registry.create(&selector, &config()).expect("adapter");
        assert_eq!(adapter.id(), "openai");
        assert_eq!(adapter.model(), Some("gpt-4"));
    }

    #[test]
    fn unknown_model_is_not_rejected() {
        let registry = ProviderRegistry::builtin();
        let selector = ProviderSelector::parse("openai/gpt-7-preview").expect("valid");
        let adapter = registry.create(&selector, &config()).expect("adapter");
        assert_eq!(adapter.model(), Some("gpt-7-preview"));
    }

    #[test]
    fn unknown_provider_lists_alternatives() {
        let registry = ProviderRegistry::builtin();
        let selector = ProviderSelector::parse("babelfish").expect("valid");
        match registry.create(&selector, &config()) {
            Err(TranslateError::UnknownProvider { name, available }) => {
                assert_eq!(name, "babelfish");
                assert!(available.contains(&"deepl".to_owned()));
                assert!(available.contains(&"claude".to_owned()));
            }
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("babelfish should not resolve"),
        }
    }

    #[test]
    fn missing_credential_fails_before_any_request() {
        let registry = ProviderRegistry::builtin();
        let selector = ProviderSelector::parse("anthropic").expect("valid");
        match registry.create(&selector, &config()) {
            Err(TranslateError::Config(crate::config::ConfigError::MissingCredential {
                provider,
                ..
            })) => assert_eq!(provider, "anthropic"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("anthropic has no key"),
        }
    }

    #[test]
    fn register_replaces_same_id() {
        let mut registry = ProviderRegistry::empty();
        registry.register(
            ProviderInfo::new("local", ProviderKind::Api).requires_api_key(false),
            |_| Err(TranslateError::EmptyProviderList),
        );
        registry.register(
            ProviderInfo::new("local", ProviderKind::Api)
                .with_name("Local")
                .requires_api_key(false),
            |_| Err(TranslateError::EmptyText),
        );
        assert_eq!(registry.providers().count(), 1);
        assert_eq!(registry.get("local").map(|p| p.name.as_str()), Some("Local"));

        let selector = ProviderSelector::parse("local").expect("valid");
        assert!(matches!(
            registry.create(&selector, &Config::new()),
            Err(TranslateError::EmptyText)
        ));
    }
}
