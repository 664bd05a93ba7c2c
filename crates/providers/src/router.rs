//! Provider selection from configuration.

use std::sync::Arc;
use std::time::Duration;
use energy_advisor_config::AppConfig;
use energy_advisor_core::error::ProviderError;
use energy_advisor_core::provider::Provider;
use tracing::info;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured default provider.
///
/// The API key and base URL come from `[providers.<name>]` when present,
/// then from the top-level settings, then from the well-known defaults.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .or_else(|| config.api_url.clone())
        .or_else(|| default_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Provider '{name}' has no known base URL; set api_url"
            ))
        })?;

    let api_key = match api_key {
        Some(key) => key,
        None if is_local(name) => String::new(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "No API key for provider '{name}'"
            )));
        }
    };

    info!(provider = %name, base_url = %base_url, "Configured model provider");

    Ok(Arc::new(OpenAiCompatProvider::with_timeout(
        name,
        base_url,
        api_key,
        Duration::from_secs(config.agent.request_timeout_secs),
    )))
}

/// The model to request: the provider's own default, else the global one.
pub fn resolve_model(config: &AppConfig) -> String {
    config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "vocareum" => Some("https://openai.vocareum.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
