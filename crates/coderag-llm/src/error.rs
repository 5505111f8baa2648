#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{provider} returned {actual} embeddings for {expected} inputs")]
    EmbedCount {
        provider: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
