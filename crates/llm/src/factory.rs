//! LLM provider factory.
//!
//! Resolves a provider name plus optional endpoint and key into a shared
//! [`LlmClient`].

use crate::client::LlmClient;
use crate::providers::OpenAiCompatClient;
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("together", "openai", "openai-compatible", "ollama")
/// * `endpoint` - Optional custom base URL; required for "openai-compatible"
/// * `api_key` - Optional API key; required for hosted providers
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns error if the provider is unknown, a required key or endpoint is
/// missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(format!("{} provider requires API key", provider_type.as_str()));
    }

    let base_url = endpoint
        .or_else(|| provider_type.default_endpoint())
        .ok_or_else(|| format!("{} provider requires an endpoint", provider_type.as_str()))?;

    tracing::debug!(provider = provider_type.as_str(), base_url, "Creating LLM client");

    let client = OpenAiCompatClient::with_timeout(base_url, api_key.map(str::to_string), timeout)
        .with_provider_name(provider_type.as_str());

    Ok(Arc::new(client))
}
