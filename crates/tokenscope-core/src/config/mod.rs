use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::Timeouts;
use crate::rank::{RankOptions, DEFAULT_MAX_TOKEN_CHARS, DEFAULT_TOP_K};
use crate::session::SessionConfig;

/// Environment variable that overrides `server.base_url`.
pub const API_BASE_ENV: &str = "TOKENSCOPE_API_BASE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub session: SessionSettings,
    pub display: DisplaySettings,
    pub model: ModelSettings,
    /// Base URL given on the command line; beats the env var and the file.
    #[serde(skip)]
    pub api_base_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Loading may download weights, hence the long default.
    pub load_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub top_k: usize,
    pub max_token_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub default_path: String,
    pub custom_weights_path: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
            load_timeout_ms: 600_000,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_token_chars: DEFAULT_MAX_TOKEN_CHARS,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_path: "gpt2".to_string(),
            custom_weights_path: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tokenscope")
            .join("config.toml")
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), crate::error::TokenscopeError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), crate::error::TokenscopeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TokenscopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn with_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_override = Some(base_url.into());
        self
    }

    /// Server base URL: explicit override, then `TOKENSCOPE_API_BASE`, then
    /// `server.base_url`.
    pub fn api_base(&self) -> String {
        let non_blank = |v: &String| !v.trim().is_empty();
        self.api_base_override
            .clone()
            .filter(non_blank)
            .or_else(|| std::env::var(API_BASE_ENV).ok().filter(non_blank))
            .unwrap_or_else(|| self.server.base_url.clone())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: Duration::from_millis(self.server.request_timeout_ms),
            load_model: Duration::from_millis(self.server.load_timeout_ms),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            debounce: Duration::from_millis(self.session.debounce_ms),
            rank: RankOptions {
                top_k: self.display.top_k,
                max_token_chars: self.display.max_token_chars,
            },
        }
    }

    /// Build the HTTP backend described by these settings.
    pub fn build_backend(&self) -> crate::api::HttpBackend {
        crate::api::HttpBackend::new(self.api_base()).with_timeouts(self.timeouts())
    }
}
