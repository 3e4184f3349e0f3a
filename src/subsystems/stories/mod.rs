//! Stories subsystem: turns a free-text prompt into a folklore story.
//!
//! [`StoryChain::resolve`] tries three tiers in order and stops at the first
//! one that produces something usable:
//!
//! 1. **model**: only when the startup probe found a model.  Output is
//!    cleaned up ([`clean_output`]) and rejected if too short.
//! 2. **keyword**: substring lookup in [`library::KEYWORD_STORIES`].
//! 3. **default**: random pick from [`library::DEFAULT_STORIES`].
//!
//! Tiers 2 and 3 cannot fail, so `resolve` is total and returns a plain
//! [`GenerationResult`] rather than a `Result`.

pub mod library;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::llm::{CompletionRequest, LlmProvider, ProviderError};

/// Default `max_length` when the client omits it.
pub const DEFAULT_MAX_LENGTH: u32 = 100;

/// Ceiling on tokens requested from the model, whatever the client asks for.
const MAX_TOKENS_CAP: u32 = 512;

const NOTE_MODEL_DISABLED: &str = "AI model is not active; serving a curated folklore story";
const NOTE_MODEL_FAILED: &str = "AI model could not produce a story; serving a curated folklore story";

// ── Result ────────────────────────────────────────────────────────────────────

/// What `POST /api/generate` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub generated_story: String,
    /// `true` only when the model tier produced the story.
    pub ai_model_used: bool,
    /// Matched keyword when the keyword tier produced the story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ── Model tier ────────────────────────────────────────────────────────────────

/// Why the model tier did not produce a story.
#[derive(Debug, Error)]
pub enum TierError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("model call exceeded {0:?}")]
    Timeout(Duration),
    #[error("model output too short ({len} < {min} chars)")]
    TooShort { len: usize, min: usize },
    #[error("model permits closed")]
    Closed,
}

/// The model-backed tier: a provider plus the limits around it.
#[derive(Debug, Clone)]
pub struct ModelTier {
    provider: LlmProvider,
    permits: Arc<Semaphore>,
    timeout: Duration,
    prompt_prefix_chars: usize,
    min_output_chars: usize,
}

impl ModelTier {
    pub fn new(provider: LlmProvider, config: &LlmConfig) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            timeout: Duration::from_secs(config.openai.timeout_seconds),
            prompt_prefix_chars: config.prompt_prefix_chars,
            min_output_chars: config.min_output_chars,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// One attempt: wait for a permit, call the provider, clean up the text.
    ///
    /// Waiting for the permit counts against the same timeout as the call,
    /// so a saturated model degrades to the curated tiers instead of queueing
    /// requests indefinitely.
    pub async fn generate(&self, prompt: &str, max_length: u32) -> Result<String, TierError> {
        let prefix = truncate_chars(prompt, self.prompt_prefix_chars);
        let request = CompletionRequest {
            prompt: prefix.to_string(),
            max_tokens: max_length.clamp(1, MAX_TOKENS_CAP),
        };

        let call = async {
            let _permit = self.permits.acquire().await.map_err(|_| TierError::Closed)?;
            self.provider.complete(&request).await.map_err(TierError::from)
        };

        let raw = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| TierError::Timeout(self.timeout))??;

        let text = clean_output(&raw, prefix);
        let len = text.chars().count();
        if len < self.min_output_chars {
            return Err(TierError::TooShort { len, min: self.min_output_chars });
        }
        Ok(text)
    }
}

/// Strip an echoed prompt, keep the first non-empty line, trim.
pub fn clean_output(raw: &str, prompt: &str) -> String {
    let body = raw.trim_start();
    let prompt = prompt.trim();
    let body = if prompt.is_empty() {
        body
    } else {
        body.strip_prefix(prompt).unwrap_or(body)
    };
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// At most `max` characters of `s`, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// The tiered resolver.  Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct StoryChain {
    model: Option<ModelTier>,
}

impl StoryChain {
    /// Chain with the model tier present.
    pub fn with_model(model: ModelTier) -> Self {
        Self { model: Some(model) }
    }

    /// Chain serving curated stories only.
    pub fn curated_only() -> Self {
        Self { model: None }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Produce a story for any prompt.  Never fails.
    pub async fn resolve(&self, prompt: &str, max_length: u32) -> GenerationResult {
        let note = match &self.model {
            None => NOTE_MODEL_DISABLED,
            Some(model) => match model.generate(prompt, max_length).await {
                Ok(text) => {
                    debug!(provider = model.provider_name(), len = text.len(), "story from model tier");
                    return GenerationResult {
                        generated_story: text,
                        ai_model_used: true,
                        theme: None,
                        note: None,
                    };
                }
                Err(e @ TierError::TooShort { .. }) => {
                    debug!(error = %e, "model tier rejected; falling through");
                    NOTE_MODEL_FAILED
                }
                Err(e) => {
                    warn!(provider = model.provider_name(), error = %e, "model tier failed; falling through");
                    NOTE_MODEL_FAILED
                }
            },
        };

        if let Some((theme, story)) = library::keyword_story(prompt) {
            debug!(%theme, "story from keyword tier");
            return GenerationResult {
                generated_story: story.to_string(),
                ai_model_used: false,
                theme: Some(theme.to_string()),
                note: Some(note.to_string()),
            };
        }

        info!(prompt_len = prompt.len(), "no keyword matched; using default story pool");
        GenerationResult {
            generated_story: library::default_story().to_string(),
            ai_model_used: false,
            theme: None,
            note: Some(note.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;

    fn model_tier(provider: LlmProvider) -> ModelTier {
        ModelTier::new(provider, &Config::test_default().llm)
    }

    fn dummy_chain(continuation: &str) -> StoryChain {
        StoryChain::with_model(model_tier(LlmProvider::Dummy(DummyProvider::new(continuation))))
    }

    #[test]
    fn clean_output_strips_echo_and_extra_lines() {
        let out = clean_output("A fox story: the fox ran far away.\nSecond line", "A fox story:");
        assert_eq!(out, "the fox ran far away.");
    }

    #[test]
    fn clean_output_without_echo_keeps_text() {
        assert_eq!(clean_output("\n\n  first real line \nmore", "unrelated"), "first real line");
        assert_eq!(clean_output("", "x"), "");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("山と川", 2), "山と");
    }

    #[tokio::test]
    async fn model_tier_success_is_reported() {
        let chain = dummy_chain(" and the mountain spirit granted the shepherd a wish.\nignored");
        let result = chain.resolve("Tell me about the mountain", 150).await;
        assert!(result.ai_model_used);
        assert_eq!(result.generated_story, "and the mountain spirit granted the shepherd a wish.");
        assert!(result.theme.is_none());
        assert!(result.note.is_none());
    }

    #[tokio::test]
    async fn too_short_model_output_falls_to_keyword() {
        let chain = dummy_chain(" ok");
        let result = chain.resolve("Tell me about the mountain", 100).await;
        assert!(!result.ai_model_used);
        assert_eq!(result.theme.as_deref(), Some("mountain"));
        assert_eq!(result.note.as_deref(), Some(NOTE_MODEL_FAILED));
    }

    #[tokio::test]
    async fn failing_provider_falls_to_default() {
        let mut cfg = Config::test_default().llm.openai;
        cfg.api_base_url = "http://127.0.0.1:1/v1/completions".into();
        let provider = OpenAiCompatibleProvider::new(&cfg, None).unwrap();
        let chain = StoryChain::with_model(model_tier(LlmProvider::OpenAiCompatible(provider)));

        let result = chain.resolve("quantum computing", 100).await;
        assert!(!result.ai_model_used);
        assert!(result.theme.is_none());
        assert!(library::DEFAULT_STORIES.contains(&result.generated_story.as_str()));
    }

    #[tokio::test]
    async fn curated_keyword_scenario() {
        let chain = StoryChain::curated_only();
        let result = chain.resolve("Tell me about the mountain", 100).await;
        assert!(!result.ai_model_used);
        assert_eq!(result.theme.as_deref(), Some("mountain"));
        let (_, stories) = library::match_keyword("mountain").unwrap();
        assert!(stories.contains(&result.generated_story.as_str()));
        assert_eq!(result.note.as_deref(), Some(NOTE_MODEL_DISABLED));
    }

    #[tokio::test]
    async fn chain_is_total_for_odd_inputs() {
        let chain = StoryChain::curated_only();
        let long = "lorem ipsum ".repeat(10_000);
        for prompt in ["", "   ", "🐉🐉🐉", "Ünïcödé ßtory", long.as_str()] {
            let result = chain.resolve(prompt, 100).await;
            assert!(!result.generated_story.is_empty());
            assert!(!result.ai_model_used);
        }
    }

    #[tokio::test]
    async fn multiple_keywords_pick_first_in_table() {
        let chain = StoryChain::curated_only();
        let result = chain.resolve("a dragon flew over the river and the forest", 100).await;
        assert_eq!(result.theme.as_deref(), Some("river"));
    }

    #[tokio::test]
    async fn long_prompt_reaches_model_truncated() {
        let chain = dummy_chain(" then the rains came and the valley bloomed again.");
        let prompt = "x".repeat(5_000);
        let result = chain.resolve(&prompt, 10_000).await;
        // Echoed prefix is stripped, so only the continuation survives.
        assert!(result.ai_model_used);
        assert_eq!(result.generated_story, "then the rains came and the valley bloomed again.");
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_model_times_out_to_curated() {
        let tier = model_tier(LlmProvider::Dummy(DummyProvider::default()));
        // Hold every permit so the next call can only wait.
        let _held = tier.permits.clone().acquire_many_owned(2).await.unwrap();
        let chain = StoryChain::with_model(tier);

        let result = chain.resolve("the moon", 100).await;
        assert!(!result.ai_model_used);
        assert_eq!(result.theme.as_deref(), Some("moon"));
    }

    #[test]
    fn result_json_omits_absent_fields() {
        let r = GenerationResult {
            generated_story: "s".into(),
            ai_model_used: true,
            theme: None,
            note: None,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("theme").is_none());
        assert!(json.get("note").is_none());
        assert_eq!(json["ai_model_used"], true);
    }
}
