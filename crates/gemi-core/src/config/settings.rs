use crate::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Every key the settings file may contain
pub const KNOWN_KEYS: &[&str] = &[
    "api_key",
    "model",
    "max_tokens",
    "temperature",
    "use_proxy",
    "proxy_url",
    "prompt_stop",
    "default_prompt",
    "save_conversation",
    "api_base_url",
    "timeout_secs",
];

/// Typed plugin configuration, resolved from the settings file with defaults.
///
/// Numbers and booleans accept their string forms (`"1000"`, `"true"`) since
/// launcher settings UIs persist every value as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens", deserialize_with = "lenient_number")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature", deserialize_with = "lenient_number")]
    pub temperature: f32,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub use_proxy: bool,

    #[serde(default)]
    pub proxy_url: String,

    /// Suffix that submits a query
    #[serde(default = "default_prompt_stop")]
    pub prompt_stop: String,

    /// Prompt table keyword used when the first word is not a keyword
    #[serde(default = "default_prompt_keyword")]
    pub default_prompt: String,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub save_conversation: bool,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Overall request timeout; 0 disables it
    #[serde(default = "default_timeout_secs", deserialize_with = "lenient_number")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_prompt_stop() -> String {
    "||".to_string()
}

fn default_prompt_keyword() -> String {
    "normal".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            use_proxy: false,
            proxy_url: String::new(),
            prompt_stop: default_prompt_stop(),
            default_prompt: default_prompt_keyword(),
            save_conversation: false,
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from a settings file.
    ///
    /// A missing or unreadable file yields the defaults, as does any single
    /// value that cannot be coerced to its type.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        Settings::load(path).config()
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Proxy URL to route API traffic through, if enabled and set
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        let url = self.proxy_url.trim();
        (self.use_proxy && !url.is_empty()).then_some(url)
    }

    /// Submit suffix; an empty `prompt_stop` falls back to the default
    #[must_use]
    pub fn stop_token(&self) -> &str {
        if self.prompt_stop.is_empty() {
            "||"
        } else {
            &self.prompt_stop
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected a boolean, got \"{other}\""
            ))),
        },
        other => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(D::Error::custom(format!("expected a number, got {other}"))),
    };
    raw.parse::<T>()
        .map_err(|e| D::Error::custom(format!("invalid number \"{raw}\": {e}")))
}

/// Key/value settings persisted as a JSON object on disk.
///
/// Every `set` rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// A missing file yields empty settings. An unreadable or malformed file is
    /// logged and also yields empty settings.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(e) => {
                warn!("Ignoring settings at {}: {}", path.display(), e);
                Map::new()
            }
        };
        super::validation::warn_unknown_fields(&values, "settings.json");
        Self { path, values }
    }

    fn read(path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Config(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub(crate) fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value and persist the whole settings object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if !KNOWN_KEYS.contains(&key.as_str()) {
            warn!("Setting unknown key: {key}");
        }
        self.values.insert(key, value);
        self.save()
    }

    /// Save settings to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Typed view of the current values.
    ///
    /// A value that cannot be coerced is logged and replaced by its default;
    /// every other value is kept.
    #[must_use]
    pub fn config(&self) -> Config {
        let mut values = self.values().clone();
        values.retain(|key, value| match Self::check_value(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}; using the default");
                false
            }
        });

        serde_json::from_value(Value::Object(values)).unwrap_or_else(|e| {
            warn!("Invalid settings in {}: {e}", self.path.display());
            Config::default()
        })
    }

    /// Check that `value` can be coerced to the type of setting `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the key if the value is rejected.
    pub fn check_value(key: &str, value: &Value) -> Result<()> {
        let mut single = Map::new();
        single.insert(key.to_string(), value.clone());
        serde_json::from_value::<Config>(Value::Object(single))
            .map(drop)
            .map_err(|e| Error::Config(format!("Invalid setting {key}: {e}")))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
