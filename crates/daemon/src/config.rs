use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::widget::{WidgetSpec, DEFAULT_CLIENT_ID, DEFAULT_SCRIPT_URL};

/// Env vars consulted for the backend API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no API key: set one of {}", API_KEY_VARS.join(", "))]
    MissingApiKey,
}

/// Daemon configuration file. Every field is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub demo: DemoConfig,
    pub widget: WidgetConfig,
    pub gemini: GeminiConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Company the generated privacy policy is written for.
    pub company_name: String,
    pub website_url: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            company_name: "SecureAuth Pro".to_string(),
            website_url: "https://secureauth-demo.app".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub client_id: String,
    pub script_url: String,
    /// Give up on a mounted widget after this long and mount a fresh one.
    /// Unset means wait forever.
    pub timeout_secs: Option<u64>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-flash-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl DaemonConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }

    pub fn widget_spec(&self) -> WidgetSpec {
        WidgetSpec {
            client_id: self.widget.client_id.clone(),
            script_url: self.widget.script_url.clone(),
        }
    }

    pub fn widget_timeout(&self) -> Option<Duration> {
        self.widget.timeout_secs.map(Duration::from_secs)
    }
}

/// Reads the API key from the process environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(|name| std::env::var(name).ok())
}

/// First non-empty value among [`API_KEY_VARS`].
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or(ConfigError::MissingApiKey)
}
