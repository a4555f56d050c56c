use crate::Result;
use anyhow::anyhow;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub credential: CredentialSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialSection {
    #[serde(default)]
    pub secret_url: String,
    #[serde(default = "default_secret_name")]
    pub secret_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

// Default values
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_max_completion_tokens() -> u32 {
    1500
}
fn default_timeout() -> String {
    "60s".to_string()
}
fn default_secret_name() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_rust_log_format() -> String {
    "text".to_string()
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_completion_tokens: default_max_completion_tokens(),
            timeout: default_timeout(),
        }
    }
}

impl Default for CredentialSection {
    fn default() -> Self {
        Self {
            secret_url: String::new(),
            secret_name: default_secret_name(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

pub fn get(name: &str) -> Result<String> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(value);
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(val);
    }

    // Priority 3: TOML config
    let toml_value = match name {
        "OPENAI_BASE_URL" => Some(CONFIG.analysis.base_url.clone()),
        "OPENAI_MODEL" => Some(CONFIG.analysis.model.clone()),
        "OPENAI_MAX_COMPLETION_TOKENS" => {
            Some(CONFIG.analysis.max_completion_tokens.to_string())
        }
        "ANALYSIS_TIMEOUT" => Some(CONFIG.analysis.timeout.clone()),
        "SECRET_URL" => Some(CONFIG.credential.secret_url.clone()),
        "SECRET_NAME" => Some(CONFIG.credential.secret_name.clone()),
        "RUST_LOG_FORMAT" => Some(CONFIG.logging.rust_log_format.clone()),
        // the API key is never read from files
        _ => None,
    };

    if let Some(value) = toml_value
        && !value.is_empty()
    {
        return Ok(value);
    }

    Err(anyhow!("Configuration key not found: {}", name))
}

pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

pub fn unset(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}

fn get_from_store(name: &str) -> Option<String> {
    if let Ok(store) = CONFIG_STORE.lock() {
        store.get(name).cloned()
    } else {
        None
    }
}

/// Load configuration from TOML files with priority:
/// 1. config/config.local.toml (git-ignored, for local overrides)
/// 2. config/config.toml (git-managed template)
/// 3. Default values
fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let base_path = "config/config.toml";
    if Path::new(base_path).exists() {
        let content = fs::read_to_string(base_path)?;
        config = toml::from_str(&content)?;
    }

    let local_path = "config/config.local.toml";
    if Path::new(local_path).exists() {
        let content = fs::read_to_string(local_path)?;
        let local_config: Config = toml::from_str(&content)?;
        merge_config(&mut config, local_config);
    }

    Ok(config)
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    if local.analysis.base_url != default_base_url() {
        base.analysis.base_url = local.analysis.base_url;
    }
    if local.analysis.model != default_model() {
        base.analysis.model = local.analysis.model;
    }
    if local.analysis.max_completion_tokens != default_max_completion_tokens() {
        base.analysis.max_completion_tokens = local.analysis.max_completion_tokens;
    }
    if local.analysis.timeout != default_timeout() {
        base.analysis.timeout = local.analysis.timeout;
    }

    if !local.credential.secret_url.is_empty() {
        base.credential.secret_url = local.credential.secret_url;
    }
    if local.credential.secret_name != default_secret_name() {
        base.credential.secret_name = local.credential.secret_name;
    }

    if local.logging.rust_log_format != default_rust_log_format() {
        base.logging.rust_log_format = local.logging.rust_log_format;
    }
}
