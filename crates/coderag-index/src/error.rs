//! Error types for coderag-index.

/// Errors that can occur while building, loading, or querying a corpus.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No corpus is loaded in memory or persisted on disk yet.
    #[error("corpus not built: run an index build first")]
    NotBuilt,

    /// Chunk list and vector index disagree on size. Requires a rebuild.
    #[error("corpus inconsistent: {chunks} chunk records but {vectors} indexed vectors")]
    Consistency { chunks: usize, vectors: usize },

    /// Query rejected before reaching the embedder.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Search attempted against an index holding no vectors.
    #[error("vector index is empty")]
    EmptyIndex,

    /// Vector length does not match the index dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted vector index is truncated or not in the expected format.
    #[error("invalid index file: {0}")]
    Format(String),

    /// IO error reading or writing corpus artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedding backend error.
    #[error("embedding error: {0}")]
    Llm(#[from] coderag_llm::LlmError),
}

impl IndexError {
    /// The caller should build a corpus and retry.
    #[must_use]
    pub fn is_not_built(&self) -> bool {
        matches!(self, Self::NotBuilt)
    }

    /// The persisted corpus is unusable until rebuilt.
    #[must_use]
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
