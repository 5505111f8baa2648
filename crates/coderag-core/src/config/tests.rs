use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 6] = [
    "CODERAG_LLM_BASE_URL",
    "CODERAG_LLM_MODEL",
    "CODERAG_LLM_EMBEDDING_MODEL",
    "CODERAG_CODE_DIR",
    "CODERAG_STORE_DIR",
    "CODERAG_TOP_K",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.llm.model, "qwen2.5-coder:1.5b");
    assert_eq!(config.llm.embedding_model, "all-minilm");
    assert_eq!(config.index.code_dir, PathBuf::from("data/codebase"));
    assert_eq!(config.index.store_dir, PathBuf::from("vector_store"));
    assert_eq!(config.index.chunks_file, "id_mapping.json");
    assert_eq!(config.index.window_lines, 20);
    assert!(config.index.extensions.iter().any(|e| e == "hpp"));
    assert_eq!(config.retrieval.top_k, 5);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/coderag.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 5);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[llm]
base_url = "http://gpu:1234"
model = "llama3:8b"

[index]
code_dir = "./src"
window_lines = 40
extensions = ["rs", "toml"]

[retrieval]
top_k = 8
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.base_url, "http://gpu:1234");
    assert_eq!(config.llm.model, "llama3:8b");
    assert_eq!(config.llm.embedding_model, "all-minilm");
    assert_eq!(config.index.code_dir, PathBuf::from("./src"));
    assert_eq!(config.index.window_lines, 40);
    assert_eq!(config.index.index_file, "index.flat");
    assert_eq!(config.retrieval.top_k, 8);

    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.chunker.window_lines, 40);
    assert!(pipeline.extensions.is_indexable(Path::new("main.rs")));
    assert!(!pipeline.extensions.is_indexable(Path::new("main.c")));
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[retrieval]\ntop_k = \"many\"\n").unwrap();
    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    unsafe {
        std::env::set_var("CODERAG_LLM_MODEL", "codellama:7b");
        std::env::set_var("CODERAG_STORE_DIR", "/tmp/coderag-store");
        std::env::set_var("CODERAG_TOP_K", "3");
    }

    let config = Config::load(Path::new("/nonexistent/coderag.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.model, "codellama:7b");
    assert_eq!(config.index.store_dir, PathBuf::from("/tmp/coderag-store"));
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(
        config.corpus_store().chunks_path(),
        Path::new("/tmp/coderag-store/id_mapping.json")
    );
}

#[test]
#[serial]
fn invalid_numeric_env_is_ignored() {
    clear_env();
    unsafe { std::env::set_var("CODERAG_TOP_K", "lots") };
    let config = Config::load(Path::new("/nonexistent/coderag.toml")).unwrap();
    clear_env();
    assert_eq!(config.retrieval.top_k, 5);
}

#[test]
fn validate_rejects_zero_top_k_and_window() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.index.window_lines = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.llm.embedding_model = "  ".into();
    assert!(config.validate().is_err());
}
