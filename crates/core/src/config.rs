use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const ENV_TIMEOUT_SECS: &str = "POLYGLOT_TIMEOUT_SECS";
pub const API_KEY_SUFFIX: &str = "_api_key";
pub const BASE_URL_SUFFIX: &str = "_base_url";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

pub fn api_key_name(provider: &str) -> String {
    format!("{provider}{API_KEY_SUFFIX}")
}

pub fn base_url_name(provider: &str) -> String {
    format!("{provider}{BASE_URL_SUFFIX}")
}

/// Credentials and endpoint overrides keyed by name (`openai_api_key`,
/// `deepl_base_url`, ...), kept in insertion order.
///
/// Built once, then shared read-only by every translation call.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    entries: Vec<(String, String)>,
    timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `(key, value)` pairs, validating each one.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::new();
        config.extend(entries)?;
        Ok(config)
    }

    /// Reads `<PROVIDER>_API_KEY` and `<PROVIDER>_BASE_URL` for each provider,
    /// plus [`ENV_TIMEOUT_SECS`].
    pub fn from_env<'a>(
        env: &impl Env,
        providers: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for provider in providers {
            let key_name = api_key_name(provider);
            if let Some(key) = resolve_api_key(&key_name.to_uppercase(), env)? {
                config.set(key_name, key.expose())?;
            }
            let url_name = base_url_name(provider);
            if let Some(url) = env.var(&url_name.to_uppercase()) {
                config.set(url_name, url)?;
            }
        }
        if let Some(raw) = env.var(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        Ok(config)
    }

    pub fn extend<I, K, V>(&mut self, entries: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Inserts or replaces an entry. A replaced entry keeps its original
    /// position, so "first configured provider" does not move on update.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let key = key.into().trim().to_lowercase();
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        let value = value.into();
        if key.ends_with(API_KEY_SUFFIX) {
            ApiKey::new(value.as_str())?;
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The credential for `provider`, or a configuration error naming the
    /// missing key.
    pub fn api_key(&self, provider: &str) -> Result<ApiKey, ConfigError> {
        let key = api_key_name(provider);
        match self.get(&key) {
            Some(value) => ApiKey::new(value),
            None => Err(ConfigError::MissingCredential {
                provider: provider.to_owned(),
                key,
            }),
        }
    }

    pub fn base_url(&self, provider: &str) -> Option<&str> {
        self.get(&base_url_name(provider))
    }

    /// Providers that have a credential, in insertion order.
    pub fn credential_providers(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter_map(|(k, _)| k.strip_suffix(API_KEY_SUFFIX))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if key.ends_with(API_KEY_SUFFIX) {
                map.entry(key, &"**redacted**");
            } else {
                map.entry(key, value);
            }
        }
        map.entry(&"timeout", &self.timeout);
        map.finish()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("configuration key must not be empty")]
    EmptyKey,
    #[error("missing credential '{key}' for provider '{provider}'")]
    MissingCredential { provider: String, key: String },
    #[error("no provider is configured; set at least one '<provider>_api_key'")]
    NoProviderConfigured,
    #[error("timeout must be > 0")]
    ZeroTimeout,
    #[error("invalid timeout '{0}', expected whole seconds")]
    InvalidTimeout(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Reads and validates an API key from `env_key`. An unset variable is
/// `None`; a blank one is an error.
pub fn resolve_api_key(env_key: &str, env: &impl Env) -> Result<Option<ApiKey>, ConfigError> {
    env.var(env_key).map(ApiKey::new).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_read_from_env() {
        let env = MapEnv::default().with_var("DEEPL_API_KEY", "env-key");
        let key = resolve_api_key("DEEPL_API_KEY", &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
        assert_eq!(resolve_api_key("OPENAI_API_KEY", &env), Ok(None));
    }

    #[test]
    fn blank_api_key_in_env_is_rejected() {
        let env = MapEnv::default().with_var("OPENAI_API_KEY", " ");
        assert_eq!(
            resolve_api_key("OPENAI_API_KEY", &env),
            Err(ConfigError::EmptyApiKey)
        );
        assert_eq!(
            Config::from_env(&env, ["openai"]),
            Err(ConfigError::EmptyApiKey)
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret").expect("valid");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");

        let config = Config::from_entries([("openai_api_key", "sk-secret")]).expect("valid");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert_eq!(
            Config::from_entries([("openai_api_key", "  ")]),
            Err(ConfigError::EmptyApiKey)
        );
    }

    #[test]
    fn missing_credential_names_the_key() {
        let config = Config::new();
        assert_eq!(
            config.api_key("anthropic"),
            Err(ConfigError::MissingCredential {
                provider: "anthropic".to_owned(),
                key: "anthropic_api_key".to_owned(),
            })
        );
    }

    #[test]
    fn credential_providers_keep_insertion_order() {
        let mut config = Config::from_entries([
            ("deepl_api_key", "d"),
            ("openai_base_url", "http://localhost"),
            ("openai_api_key", "o"),
        ])
        .expect("valid");
        config.set("DeepL_API_KEY", "d2").expect("valid");

        let providers: Vec<_> = config.credential_providers().collect();
        assert_eq!(providers, ["deepl", "openai"]);
        assert_eq!(config.api_key("deepl").expect("present").expose(), "d2");
        assert_eq!(config.base_url("openai"), Some("http://localhost"));
    }

    #[test]
    fn from_env_reads_keys_urls_and_timeout() {
        let env = MapEnv::default()
            .with_var("OPENAI_API_KEY", "o")
            .with_var("GOOGLE_BASE_URL", "http://mock")
            .with_var(ENV_TIMEOUT_SECS, "5");
        let config = Config::from_env(&env, ["google", "openai"]).expect("valid");

        assert_eq!(config.api_key("openai").expect("present").expose(), "o");
        assert_eq!(config.base_url("google"), Some("http://mock"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn from_env_rejects_bad_timeout() {
        let env = MapEnv::default().with_var(ENV_TIMEOUT_SECS, "soon");
        assert_eq!(
            Config::from_env(&env, std::iter::empty::<&str>()),
            Err(ConfigError::InvalidTimeout("soon".to_owned()))
        );
        let env = MapEnv::default().with_var(ENV_TIMEOUT_SECS, "0");
        assert_eq!(Config::from_env(&env, std::iter::empty::<&str>()), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(Config::new().timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
