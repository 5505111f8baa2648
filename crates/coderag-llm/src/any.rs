#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;

use crate::error::LlmError;
use crate::provider::{Embedder, Message, TextGenerator};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl Embedder for AnyProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        delegate_provider!(self, |p| p.embed_batch(texts).await)
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| Embedder::name(p))
    }
}

impl TextGenerator for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.chat(messages).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_variant_delegates_name() {
        let provider = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "m".into(),
            "e".into(),
        ));
        assert_eq!(Embedder::name(&provider), "ollama");
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn mock_variant_delegates_embed() {
        let provider = AnyProvider::Mock(MockProvider::default());
        let vectors = provider.embed_batch(&["fn a".to_owned()]).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(Embedder::name(&provider), "mock");
    }
}
