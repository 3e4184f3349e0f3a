//! Provider implementations.
//!
//! `build(config, api_key)` is the factory: called once by the startup
//! probe. Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models. A disabled provider is not an error here; the
/// probe checks [`LlmConfig::is_disabled`] before calling this.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider::default())),
        "openai" | "openai-compatible" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(&config.openai, api_key)?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}
