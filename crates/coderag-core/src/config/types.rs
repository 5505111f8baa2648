use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "qwen2.5-coder:1.5b".into()
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_code_dir")]
    pub code_dir: PathBuf,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_chunks_file")]
    pub chunks_file: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_window_lines")]
    pub window_lines: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_code_dir() -> PathBuf {
    PathBuf::from("data/codebase")
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("vector_store")
}

fn default_chunks_file() -> String {
    "id_mapping.json".into()
}

fn default_index_file() -> String {
    "index.flat".into()
}

fn default_window_lines() -> usize {
    20
}

fn default_extensions() -> Vec<String> {
    coderag_index::languages::DEFAULT_EXTENSIONS
        .iter()
        .map(|e| (*e).to_owned())
        .collect()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            code_dir: default_code_dir(),
            store_dir: default_store_dir(),
            chunks_file: default_chunks_file(),
            index_file: default_index_file(),
            window_lines: default_window_lines(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}
