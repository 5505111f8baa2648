mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};
use coderag_index::ChunkerConfig;
use coderag_index::languages::ExtensionFilter;
use coderag_index::pipeline::PipelineConfig;
use coderag_index::store::CorpusStore;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to sensible defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if self.index.window_lines == 0 {
            bail!("index.window_lines must be at least 1");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.llm.embedding_model.trim().is_empty() {
            bail!("llm.embedding_model must not be empty");
        }
        if self.index.extensions.is_empty() {
            bail!("index.extensions must list at least one extension");
        }
        Ok(())
    }

    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunker: ChunkerConfig {
                window_lines: self.index.window_lines,
            },
            extensions: ExtensionFilter::new(&self.index.extensions),
        }
    }

    #[must_use]
    pub fn corpus_store(&self) -> CorpusStore {
        CorpusStore::in_dir(
            &self.index.store_dir,
            &self.index.chunks_file,
            &self.index.index_file,
        )
    }
}
