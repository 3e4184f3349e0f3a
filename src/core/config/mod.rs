//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `FOLKLORE_*`, `STORE_URL`, `DB_NAME`, `AI_MODEL` and
//! `LLM_API_KEY` env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs consumed by the server
//!   (`Config`, `StoreConfig`, `LlmConfig`, etc.).
//! - **raw**: Raw TOML deserialization types (`RawConfig`, `RawLlm`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Safe `Config` for tests: in-memory store, model disabled, no API keys,
    /// no external calls.
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            server: ServerConfig { bind: "127.0.0.1:0".into() },
            store: StoreConfig {
                url: ":memory:".into(),
                db_name: "test_database".into(),
                connect_timeout_seconds: 1,
            },
            llm: LlmConfig {
                provider: "disabled".into(),
                max_concurrent: 2,
                prompt_prefix_chars: raw::default_prompt_prefix_chars(),
                min_output_chars: raw::default_min_output_chars(),
                probe_timeout_seconds: 1,
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    top_p: 1.0,
                    repetition_penalty: 1.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}
