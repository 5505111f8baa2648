//! Retrieval-augmented answers: top-k chunk records fed to a text generator.

use std::sync::Arc;

use coderag_index::context::join_for_generation;
use coderag_index::{ChunkRecord, IndexError, Pipeline};
use coderag_llm::provider::Message;
use coderag_llm::{Embedder, LlmError, TextGenerator};
use serde::Serialize;

const SYSTEM_PROMPT: &str = "You are a code generation assistant. Your task is to \
provide only the requested code or code modifications, without any additional \
conversational text, explanations, or examples. Focus strictly on the code. \
STICK TO THE CODE";

const ASSISTANT_MARKER: &str = "Assistant:";

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Generated answer together with the records it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub chunks: Vec<ChunkRecord>,
}

pub struct AnswerService<P: Embedder + TextGenerator> {
    pipeline: Arc<Pipeline<P>>,
    generator: Arc<P>,
}

impl<P: Embedder + TextGenerator> AnswerService<P> {
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline<P>>, generator: Arc<P>) -> Self {
        Self {
            pipeline,
            generator,
        }
    }

    /// Retrieve `top_k` records for `question` and generate an answer from them.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQuestion` for a blank question, or the retrieval or
    /// generation error.
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<Answer, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let chunks = self.pipeline.retrieve(question, top_k).await?;
        tracing::debug!(question, retrieved = chunks.len(), "generating answer");

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(&join_for_generation(&chunks), question)),
        ];
        let raw = self.generator.chat(&messages).await?;

        Ok(Answer {
            question: question.to_owned(),
            answer: clean_answer(&raw).to_owned(),
            chunks,
        })
    }
}

fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using only the code context below:\n\n\
         CODE:\n{context}\n\nQUESTION:\n{question}\n"
    )
}

/// Trim generator output and drop any echoed transcript before the last
/// `Assistant:` marker.
fn clean_answer(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.rfind(ASSISTANT_MARKER) {
        Some(pos) => trimmed[pos + ASSISTANT_MARKER.len()..].trim(),
        None => trimmed,
    }
}
