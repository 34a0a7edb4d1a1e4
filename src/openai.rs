//! OpenAI client configuration with sensible defaults.

use crate::config::TranscriptionSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from transcription settings.
///
/// The API key comes from `OPENAI_API_KEY`; `api_base` lets the transcriber
/// target any OpenAI-compatible server.
pub fn create_client(settings: &TranscriptionSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default();
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }
    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
