//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub store: RawStore,
    #[serde(default)]
    pub llm: RawLlm,
}

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level() }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawStore {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            db_name: default_db_name(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_prompt_prefix_chars")]
    pub prompt_prefix_chars: usize,
    #[serde(default = "default_min_output_chars")]
    pub min_output_chars: usize,
    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            max_concurrent: default_max_concurrent(),
            prompt_prefix_chars: default_prompt_prefix_chars(),
            min_output_chars: default_min_output_chars(),
            probe_timeout_seconds: default_probe_timeout_seconds(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_top_p")]
    pub top_p: f32,
    #[serde(default = "default_openai_repetition_penalty")]
    pub repetition_penalty: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            top_p: default_openai_top_p(),
            repetition_penalty: default_openai_repetition_penalty(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_bind() -> String { "0.0.0.0:8001".to_string() }
pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_store_url() -> String { "~/.folklore/data".to_string() }
pub(super) fn default_db_name() -> String { "test_database".to_string() }
pub(super) fn default_connect_timeout_seconds() -> u64 { 5 }
pub(super) fn default_llm_provider() -> String { "disabled".to_string() }
pub(super) fn default_max_concurrent() -> usize { 4 }
pub(super) fn default_prompt_prefix_chars() -> usize { 200 }
pub(super) fn default_min_output_chars() -> usize { 20 }
pub(super) fn default_probe_timeout_seconds() -> u64 { 5 }
pub(super) fn default_openai_api_base_url() -> String { "http://127.0.0.1:8081/v1/completions".to_string() }
pub(super) fn default_openai_model() -> String { "gpt2".to_string() }
pub(super) fn default_openai_temperature() -> f32 { 0.8 }
pub(super) fn default_openai_top_p() -> f32 { 0.9 }
pub(super) fn default_openai_repetition_penalty() -> f32 { 1.2 }
pub(super) fn default_openai_timeout_seconds() -> u64 { 30 }
