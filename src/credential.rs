use crate::Result;
use crate::config;
use crate::logging::*;
use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer credential for the completion endpoint. Resolved once at startup
/// and only ever read afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            bail!("API key is empty");
        }
        Ok(ApiKey(value))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

#[derive(Debug, Serialize)]
struct SecretRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct SecretResponse {
    value: Option<String>,
    error: Option<String>,
}

/// Asks a secret-store function for the value registered under `name`.
pub async fn fetch_secret(client: &reqwest::Client, url: &str, name: &str) -> Result<ApiKey> {
    let log = DEFAULT.new(o!(
        "function" => "fetch_secret",
        "name" => name.to_string(),
    ));
    info!(log, "fetching secret");

    let response = client
        .post(url)
        .json(&SecretRequest { name })
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

    let status = response.status();
    let body: SecretResponse = response
        .json()
        .await
        .context("Failed to parse secret response")?;

    if !status.is_success() {
        let message = body.error.unwrap_or_else(|| "unknown error".to_string());
        warn!(log, "secret lookup failed"; "status" => %status, "error" => %message);
        return Err(anyhow!("secret lookup failed ({}): {}", status, message));
    }

    match body.value {
        Some(value) => ApiKey::new(value),
        None => Err(anyhow!("secret response has no value")),
    }
}

/// Resolves the credential: `OPENAI_API_KEY` when configured, otherwise the
/// secret store at `SECRET_URL`.
pub async fn resolve(client: &reqwest::Client) -> Result<ApiKey> {
    let log = DEFAULT.new(o!("function" => "credential::resolve"));

    if let Ok(key) = config::get("OPENAI_API_KEY") {
        debug!(log, "using configured API key");
        return ApiKey::new(key);
    }

    match config::get("SECRET_URL") {
        Ok(url) => {
            let name = config::get("SECRET_NAME").unwrap_or_else(|_| "OPENAI_API_KEY".to_string());
            fetch_secret(client, &url, &name).await
        }
        Err(_) => Err(anyhow!(
            "no credential configured: set OPENAI_API_KEY or SECRET_URL"
        )),
    }
}
