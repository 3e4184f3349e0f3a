//! Dummy provider: echoes the prompt back followed by a fixed continuation,
//! the way a raw causal language model returns prompt + generated text.
//! Used to exercise the model tier end to end without a real backend.

use crate::llm::{CompletionRequest, ProviderError};

const DEFAULT_CONTINUATION: &str = " Long ago, when the rivers still spoke to those who listened, \
an old storyteller carried this tale from village to village.\nThe end.";

#[derive(Debug, Clone)]
pub struct DummyProvider {
    continuation: String,
}

impl Default for DummyProvider {
    fn default() -> Self {
        Self { continuation: DEFAULT_CONTINUATION.to_string() }
    }
}

impl DummyProvider {
    /// Provider whose output is always `prompt + continuation`.
    pub fn new(continuation: impl Into<String>) -> Self {
        Self { continuation: continuation.into() }
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        Ok(format!("{}{}", request.prompt, self.continuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(prompt: &str) -> CompletionRequest {
        CompletionRequest { prompt: prompt.into(), max_tokens: 50 }
    }

    #[tokio::test]
    async fn complete_echoes_prompt_first() {
        let p = DummyProvider::default();
        let out = p.complete(&req("A fox")).await.unwrap();
        assert!(out.starts_with("A fox Long ago"));
    }

    #[tokio::test]
    async fn custom_continuation() {
        let p = DummyProvider::new(" ok");
        assert_eq!(p.complete(&req("")).await.unwrap(), " ok");
    }
}
