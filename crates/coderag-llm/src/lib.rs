//! Embedding and text-generation backends consumed by the retrieval core.

pub mod any;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use error::LlmError;
pub use provider::{Embedder, TextGenerator};
