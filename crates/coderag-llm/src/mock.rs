//! Test-only mock provider.
//!
//! Embeddings are hashed bag-of-tokens vectors: texts sharing identifiers land
//! close together under L2, which is enough to exercise retrieval ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{Embedder, Message, TextGenerator};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    pub dimension: usize,
    pub fail_embed: bool,
    pub fail_chat: bool,
    embed_calls: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<Vec<Message>>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            dimension: 64,
            fail_embed: false,
            fail_chat: false,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_embed: true,
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }

    /// Number of `embed_batch` calls served so far.
    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent `chat` call.
    #[must_use]
    pub fn last_prompt(&self) -> Option<Vec<Message>> {
        self.last_prompt.lock().ok().and_then(|guard| guard.clone())
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty());
        for token in tokens {
            let hash = blake3::hash(token.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let bucket = usize::from(u16::from_le_bytes([bytes[0], bytes[1]])) % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for MockProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

impl TextGenerator for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(messages.to_vec());
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self
            .responses
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))?;
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }
}
