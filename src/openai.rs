mod chat;
pub mod extract;

use crate::Result;
use crate::config;
use crate::credential::ApiKey;
use crate::errors::{AnalysisError, PreconditionError};
use crate::logging::*;
use crate::types::DataUri;
use async_trait::async_trait;
use humantime::parse_duration;
use serde_json::{Map, Value};
use std::time::Duration;

pub use chat::{ContentPart, ImageUrl, Message, Request, Response};

/// Settings for the completion endpoint, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub model: String,
    pub max_completion_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_completion_tokens: 1500,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AnalysisConfig {
    pub fn from_config() -> Result<Self> {
        let defaults = Self::default();
        let base_url = config::get("OPENAI_BASE_URL").unwrap_or(defaults.base_url);
        let model = config::get("OPENAI_MODEL").unwrap_or(defaults.model);
        let max_completion_tokens = match config::get("OPENAI_MAX_COMPLETION_TOKENS") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.max_completion_tokens,
        };
        let timeout = match config::get("ANALYSIS_TIMEOUT") {
            Ok(v) => parse_duration(&v)?,
            Err(_) => defaults.timeout,
        };
        Ok(Self {
            base_url,
            model,
            max_completion_tokens,
            timeout,
        })
    }
}

/// A multi-modal model that answers one prompt about a set of images.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Sends the prompt and images in a single request and returns the raw
    /// text of the reply.
    async fn complete(&self, prompt: &str, images: &[&DataUri]) -> Result<String, AnalysisError>;

    /// Sends the request and extracts the embedded structured payload.
    async fn analyze(
        &self,
        prompt: &str,
        images: &[&DataUri],
    ) -> Result<Map<String, Value>, AnalysisError> {
        let text = self.complete(prompt, images).await?;
        extract::payload(&text)
    }
}

pub struct Client {
    config: AnalysisConfig,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl Client {
    pub fn new(config: AnalysisConfig, api_key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

#[async_trait]
impl VisionModel for Client {
    async fn complete(&self, prompt: &str, images: &[&DataUri]) -> Result<String, AnalysisError> {
        let log = DEFAULT.new(o!(
            "function" => "Client::complete",
            "model" => self.config.model.clone(),
            "images" => images.len(),
        ));
        if prompt.trim().is_empty() {
            return Err(PreconditionError::EmptyPrompt.into());
        }

        let request = Request {
            model: self.config.model.clone(),
            messages: vec![chat::user_message(prompt, images)],
            max_completion_tokens: self.config.max_completion_tokens,
        };
        info!(log, "sending analysis request");
        let response =
            chat::complete(&self.client, &self.config.base_url, &self.api_key, &request).await?;

        let content = response
            .content()
            .ok_or_else(|| AnalysisError::Format("response has no content".to_string()))?;
        debug!(log, "analysis text received"; "length" => content.len());
        Ok(content.to_string())
    }
}
