use std::path::Path;
use std::sync::Arc;

use coderag_index::pipeline::PipelineConfig;
use coderag_index::store::CorpusStore;
use coderag_index::{BuildOutcome, Pipeline};
use coderag_llm::mock::MockProvider;

const A_C: &str = "\
int add(int a, int b)
{
    int sum = a + b;
    return sum;
}
";

fn b_py() -> String {
    let mut lines = Vec::new();
    for n in 0..20 {
        if n % 2 == 0 {
            lines.push(format!("# configuration note {n} describing deployment"));
        } else {
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

fn setup(root: &Path) -> std::path::PathBuf {
    let code = root.join("codebase");
    std::fs::create_dir_all(&code).unwrap();
    std::fs::write(code.join("a.c"), A_C).unwrap();
    std::fs::write(code.join("b.py"), b_py()).unwrap();
    code
}

fn pipeline(root: &Path) -> Pipeline<MockProvider> {
    let store = CorpusStore::in_dir(&root.join("vector_store"), "id_mapping.json", "index.flat");
    Pipeline::new(
        store,
        Arc::new(MockProvider::default().with_dimension(512)),
        PipelineConfig::default(),
    )
}

#[tokio::test]
async fn two_file_corpus_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let code = setup(dir.path());
    let pipeline = pipeline(dir.path());

    let BuildOutcome::Built(report) = pipeline.process_and_store(&code).await.unwrap() else {
        panic!("expected a build");
    };
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.fallback_chunks, 1);

    let corpus = pipeline.store().load().await.unwrap();
    assert_eq!(corpus.len(), corpus.index().len());

    let chunks = corpus.chunks();
    assert!(chunks[0].source.ends_with("a.c"));
    assert_eq!(chunks[0].start_line, 0);
    assert_eq!(chunks[0].signature, "int add(int a, int b)");
    assert!(chunks[1].source.ends_with("b.py"));
    assert!(chunks[1].is_fallback());

    let hits = pipeline.retrieve("return sum of int add", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].source.ends_with("a.c"));
}

#[tokio::test]
async fn reload_reproduces_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let code = setup(dir.path());

    let built = pipeline(dir.path());
    built.process_and_store(&code).await.unwrap();
    let before = built.retrieve("deployment configuration", 2).await.unwrap();

    let restarted = pipeline(dir.path());
    assert!(restarted.retrieve("deployment configuration", 2).await.unwrap_err().is_not_built());
    restarted.load().await.unwrap();
    let after = restarted.retrieve("deployment configuration", 2).await.unwrap();

    assert_eq!(before, after);
    assert!(after[0].source.ends_with("b.py"));
}

#[tokio::test]
async fn oversized_k_returns_each_chunk_once() {
    let dir = tempfile::tempdir().unwrap();
    let code = setup(dir.path());
    let pipeline = pipeline(dir.path());
    pipeline.process_and_store(&code).await.unwrap();

    let hits = pipeline.retrieve("int sum", 50).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_ne!(hits[0], hits[1]);
    assert!(hits[0].source.ends_with("a.c"));
}

#[tokio::test]
async fn rebuild_replaces_previous_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let code = setup(dir.path());
    let pipeline = pipeline(dir.path());
    pipeline.process_and_store(&code).await.unwrap();

    std::fs::remove_file(code.join("b.py")).unwrap();
    std::fs::write(
        code.join("c.go"),
        "func one() {\n}\n\nfunc two() {\n}\n",
    )
    .unwrap();
    pipeline.process_and_store(&code).await.unwrap();

    let corpus = pipeline.store().load().await.unwrap();
    assert_eq!(corpus.len(), 3);
    assert!(corpus.chunks().iter().all(|c| !c.source.ends_with("b.py")));
    assert_eq!(pipeline.corpus_len().await, Some(3));
}

#[tokio::test]
async fn reset_twice_and_on_fresh_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let fresh = pipeline(dir.path());
    fresh.reset().await.unwrap();
    fresh.reset().await.unwrap();

    let code = setup(dir.path());
    let built = pipeline(dir.path());
    built.process_and_store(&code).await.unwrap();
    built.reset().await.unwrap();
    built.reset().await.unwrap();

    assert!(!built.store().chunks_path().exists());
    assert!(!built.store().index_path().exists());
    assert!(built.retrieve("int", 1).await.unwrap_err().is_not_built());
}
