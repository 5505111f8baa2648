//! Configuration and the question-answering service built on the retrieval core.

pub mod answer;
pub mod config;

pub use answer::{Answer, AnswerError, AnswerService};
pub use config::Config;
