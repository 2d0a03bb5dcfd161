use crate::translate::TranslateError;
use serde::Serialize;
use std::fmt;

/// Shorthands accepted in place of a provider id.
pub static PROVIDER_ALIASES: &[(&str, &str)] = &[
    ("google-translate", "google"),
    ("gpt", "openai"),
    ("chatgpt", "openai"),
    ("gpt-4", "openai"),
    ("gpt-3.5", "openai"),
    ("claude", "anthropic"),
    ("claude-3", "anthropic"),
];

/// Maps an alias to its provider id; anything else is returned folded.
pub fn canonical_provider(name: &str) -> String {
    let folded = name.trim().to_lowercase();
    PROVIDER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map(|(_, id)| (*id).to_owned())
        .unwrap_or(folded)
}

/// A parsed `"provider"` or `"provider/model"` string.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ProviderSelector {
    pub provider: String,
    pub model: Option<String>,
}

impl ProviderSelector {
    /// Splits on the first `/`. The model part keeps its case and any further
    /// slashes. Only an empty provider part is rejected; whether the provider
    /// or model exists is decided later.
    pub fn parse(selector: &str) -> Result<Self, TranslateError> {
        let (provider, model) = match selector.trim().split_once('/') {
            Some((provider, model)) => (provider, Some(model.trim())),
            None => (selector.trim(), None),
        };
        if provider.trim().is_empty() {
            return Err(TranslateError::InvalidSelector(selector.to_owned()));
        }
        Ok(Self {
            provider: canonical_provider(provider),
            model: model.filter(|m| !m.is_empty()).map(str::to_owned),
        })
    }
}

impl fmt::Display for ProviderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}/{}", self.provider, model),
            None => f.write_str(&self.provider),
        }
    }
}
