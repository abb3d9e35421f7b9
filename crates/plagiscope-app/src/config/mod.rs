//! Configuration loading for Plagiscope.
//! Reads plagiscope.toml from the current directory or the path in PLAGISCOPE_CONFIG.

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String { "127.0.0.1:3000".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Empty or absent falls back to the environment, see [`LlmConfig::api_key`].
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_model()             -> String { "gemini-2.5-flash".to_string() }
fn default_base_url()          -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_temperature()       -> f32    { 0.1 }
fn default_max_output_tokens() -> u32    { 8192 }
fn default_request_timeout()   -> u64    { 300 }

/// Environment variables consulted, in order, when `llm.api_key` is empty.
pub const API_KEY_ENV_VARS: [&str; 2] = ["PLAGISCOPE_GEMINI_API_KEY", "GEMINI_API_KEY"];

impl LlmConfig {
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
        if let Some(key) = &self.api_key {
            if !key.expose_secret().trim().is_empty() {
                return Some(key.clone());
            }
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .map(SecretString::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_document_type")]
    pub default_document_type: String,
    #[serde(default)]
    pub web_search_default: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { default_document_type: default_document_type(), web_search_default: false }
    }
}

fn default_document_type() -> String { "Academic essay".to_string() }


impl Config {
    /// Load configuration from plagiscope.toml.
    /// Checks PLAGISCOPE_CONFIG first, then the current directory.
    /// PLAGISCOPE_BIND overrides `server.bind`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PLAGISCOPE_CONFIG")
            .unwrap_or_else(|_| "plagiscope.toml".to_string());

        let mut config = Self::load_from(Path::new(&path))?;
        if let Ok(bind) = std::env::var("PLAGISCOPE_BIND") {
            config.server.bind = bind;
        }
        Ok(config)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file not found: {} (using defaults; copy plagiscope.example.toml to customise)",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}
