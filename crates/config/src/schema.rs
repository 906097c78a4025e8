use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Instruction sent as the first message of every provider request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant built with GitHub Copilot Extensions. \
You have deep knowledge of software development and GitHub. \
Be concise, accurate, and friendly.";

/// Variables read without the `AGENT_` prefix, for compatibility with the
/// usual hosting conventions.
const RAW_ENV_KEYS: [&str; 5] = [
    "PORT",
    "SYSTEM_PROMPT",
    "LLM_BASE_URL",
    "LLM_MODEL",
    "LLM_API_KEY",
];

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_llm_base_url() -> String {
    "https://models.inference.ai.azure.com".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    "copilot-agent".to_string()
}
fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Upper bounds for each outbound call, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Trust anchor key listing.
    #[serde(default = "TimeoutConfig::default_keys")]
    pub keys_secs: u64,
    /// Profile enrichment lookup.
    #[serde(default = "TimeoutConfig::default_profile")]
    pub profile_secs: u64,
    /// Provider dispatch, up to the response headers. The streamed body
    /// itself is not bounded.
    #[serde(default = "TimeoutConfig::default_provider")]
    pub provider_secs: u64,
}

impl TimeoutConfig {
    fn default_keys() -> u64 {
        10
    }
    fn default_profile() -> u64 {
        5
    }
    fn default_provider() -> u64 {
        30
    }

    #[must_use]
    pub fn keys(&self) -> Duration {
        Duration::from_secs(self.keys_secs)
    }

    #[must_use]
    pub fn profile(&self) -> Duration {
        Duration::from_secs(self.profile_secs)
    }

    #[must_use]
    pub fn provider(&self) -> Duration {
        Duration::from_secs(self.provider_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            keys_secs: Self::default_keys(),
            profile_secs: Self::default_profile(),
            provider_secs: Self::default_provider(),
        }
    }
}

/// Top-level application configuration.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,
    /// The agent's persona, sent as the provider's system message.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Base URL of the OpenAI-compatible provider; `/chat/completions` is appended.
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,
    /// Provider model identifier.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Provider credential used when the caller does not supply one.
    #[serde(default)]
    pub llm_api_key: Option<String>,
    /// GitHub REST API root, hosting both the key listing and the user profile.
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    /// `User-Agent` sent on every outbound request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// How long a fetched key set may be reused. `0` fetches on every request.
    #[serde(default)]
    pub key_cache_ttl_secs: u64,
    /// Largest accepted request body, checked before signature verification.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            system_prompt: default_system_prompt(),
            llm_base_url: default_llm_base_url(),
            llm_model: default_llm_model(),
            llm_api_key: None,
            github_api_url: default_github_api_url(),
            user_agent: default_user_agent(),
            key_cache_ttl_secs: 0,
            max_body_bytes: default_max_body_bytes(),
            timeouts: TimeoutConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
    }

    /// Loads defaults, then the optional YAML file, then the environment.
    ///
    /// Recognised variables are `PORT`, `SYSTEM_PROMPT`, `LLM_BASE_URL`,
    /// `LLM_MODEL`, `LLM_API_KEY`, and any field prefixed with `AGENT_`
    /// (nested fields separated by `__`, e.g. `AGENT_TIMEOUTS__KEYS_SECS`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be parsed or a value
    /// has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            // figment treats a missing file as empty; an explicit path must exist.
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::raw().only(&RAW_ENV_KEYS))
            .merge(Env::prefixed("AGENT_").split("__"))
            .extract()
    }

    /// Fallback provider credential; an empty value counts as unset.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.llm_api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Trust anchor endpoint listing the Copilot request-signing keys.
    #[must_use]
    pub fn keys_url(&self) -> String {
        format!(
            "{}/meta/public_keys/copilot_api",
            self.github_api_url.trim_end_matches('/')
        )
    }

    /// Endpoint returning the authenticated user's profile.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("{}/user", self.github_api_url.trim_end_matches('/'))
    }

    /// Provider chat completions endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.llm_base_url.trim_end_matches('/')
        )
    }

    /// Key set reuse window, `None` when caching is disabled.
    #[must_use]
    pub fn key_cache_ttl(&self) -> Option<Duration> {
        (self.key_cache_ttl_secs > 0).then(|| Duration::from_secs(self.key_cache_ttl_secs))
    }
}
