use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODERAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("CODERAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("CODERAG_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("CODERAG_CODE_DIR") {
            self.index.code_dir = v.into();
        }
        if let Ok(v) = std::env::var("CODERAG_STORE_DIR") {
            self.index.store_dir = v.into();
        }
        if let Ok(v) = std::env::var("CODERAG_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!("ignoring invalid CODERAG_TOP_K value: {v}"),
            }
        }
    }
}
