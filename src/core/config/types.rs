//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that subsystems consume.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Server ──────────────────────────────────────────────────────────────────

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the axum listener to.
    pub bind: String,
}

// ── Store ───────────────────────────────────────────────────────────────────

/// Where the status log lives, resolved from `store.url` + `store.db_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// Empty URL: the store is switched off and never probed.
    Disabled,
    /// `:memory:`: a private in-process database, mostly for tests.
    Memory,
    /// Database file at `{url}/{db_name}.sqlite3`.
    File(PathBuf),
}

/// Document store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection string as written in config or `STORE_URL`
    /// (already `~`-expanded when it is a path).
    pub url: String,
    /// Database name; becomes the file stem of the database file.
    pub db_name: String,
    /// Upper bound on the startup open + liveness check.
    pub connect_timeout_seconds: u64,
}

impl StoreConfig {
    pub fn target(&self) -> StoreTarget {
        match self.url.trim() {
            "" => StoreTarget::Disabled,
            ":memory:" => StoreTarget::Memory,
            dir => StoreTarget::File(
                PathBuf::from(dir).join(format!("{}.sqlite3", self.db_name)),
            ),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Penalty applied to repeated tokens (1.0 = off).
    pub repetition_penalty: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration: which provider backs the model tier and how hard the
/// story chain is allowed to lean on it.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider: `"disabled"`, `"dummy"` or `"openai"`.
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    /// Maximum number of in-flight model calls across all requests.
    pub max_concurrent: usize,
    /// Prompts are cut to this many characters before reaching the model.
    pub prompt_prefix_chars: usize,
    /// Model output shorter than this (after clean-up) is rejected.
    pub min_output_chars: usize,
    /// Upper bound on the startup reachability check.
    pub probe_timeout_seconds: u64,
    pub openai: OpenAiConfig,
}

impl LlmConfig {
    /// `true` when the model tier is switched off by configuration.
    pub fn is_disabled(&self) -> bool {
        matches!(
            self.provider.trim().to_ascii_lowercase().as_str(),
            "" | "disabled" | "none" | "off"
        )
    }
}

// ── Top-level ───────────────────────────────────────────────────────────────

/// Fully-resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var: `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}
