use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Maps text to fixed-length vectors.
///
/// Implementations return exactly one vector per input, in input order, and
/// every vector produced by one instance has the same dimensionality.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts in a single backend call.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or returns a malformed response.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send;

    /// Embed one text as a single-item batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch call fails or yields no vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        async move {
            self.embed_batch(&[text.to_owned()])
                .await?
                .into_iter()
                .next()
                .ok_or(LlmError::EmptyResponse {
                    provider: self.name(),
                })
        }
    }

    fn name(&self) -> &'static str;
}

/// Produces an answer for a conversation.
pub trait TextGenerator: Send + Sync {
    /// Send messages to the model and return the assistant response.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_role() {
        assert_eq!(Message::system("s").role, Role::System);
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
