//! Corpus orchestrator: walk → chunk → embed → index → persist, plus retrieval.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coderag_llm::Embedder;
use tokio::sync::{Mutex, RwLock};

use crate::chunker::{ChunkRecord, ChunkerConfig, extract};
use crate::error::{IndexError, Result};
use crate::languages::ExtensionFilter;
use crate::store::{Corpus, CorpusStore};
use crate::vector_index::FlatL2Index;

/// Pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub chunker: ChunkerConfig,
    pub extensions: ExtensionFilter,
}

/// Summary of a successful build.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub chunks_created: usize,
    pub fallback_chunks: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Result of [`Pipeline::process_and_store`].
#[derive(Debug)]
pub enum BuildOutcome {
    /// A new corpus replaced the previous one in memory and on disk.
    Built(IndexReport),
    /// No supported files under the base path; prior state untouched.
    NoFiles,
    /// Files were found but none produced a chunk; prior state untouched.
    EmptyCorpus { files_scanned: usize },
}

impl BuildOutcome {
    #[must_use]
    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }
}

/// Result of [`Pipeline::load_or_build`].
#[derive(Debug)]
pub enum Startup {
    Loaded { chunks: usize },
    Built(BuildOutcome),
}

/// Owns the in-memory corpus and its persisted pair.
///
/// Builds, loads, and resets are serialized by one mutex; readers take an
/// `Arc` snapshot of the current corpus, so a swap is never observed half-done.
pub struct Pipeline<E: Embedder> {
    store: CorpusStore,
    embedder: Arc<E>,
    config: PipelineConfig,
    corpus: RwLock<Option<Arc<Corpus>>>,
    write_lock: Mutex<()>,
}

impl<E: Embedder> Pipeline<E> {
    #[must_use]
    pub fn new(store: CorpusStore, embedder: Arc<E>, config: PipelineConfig) -> Self {
        Self {
            store,
            embedder,
            config,
            corpus: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    /// Number of chunk records in memory, `None` before a build or load.
    pub async fn corpus_len(&self) -> Option<usize> {
        self.corpus.read().await.as_ref().map(|c| c.len())
    }

    /// Rebuild the corpus from every supported file under `base_path`.
    ///
    /// Unreadable files are logged and skipped. When nothing is chunked the
    /// previous corpus stays in place.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails, the embedder returns a wrong
    /// number of vectors, or the artifacts cannot be written.
    pub async fn process_and_store(&self, base_path: &Path) -> Result<BuildOutcome> {
        let _guard = self.write_lock.lock().await;
        let start = std::time::Instant::now();
        let mut report = IndexReport::default();

        let files = self.discover(base_path);
        if files.is_empty() {
            tracing::warn!(path = %base_path.display(), "no supported code files found");
            return Ok(BuildOutcome::NoFiles);
        }
        tracing::info!(total = files.len(), path = %base_path.display(), "indexing started");

        let mut chunks: Vec<ChunkRecord> = Vec::new();
        for path in &files {
            report.files_scanned += 1;
            let source = path.to_string_lossy().into_owned();

            let code = match read_source(path).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!(file = %source, "could not read file: {e}");
                    report.errors.push(format!("{source}: {e}"));
                    continue;
                }
            };

            let file_chunks = extract(&code, &source, &self.config.chunker);
            tracing::debug!(file = %source, chunks = file_chunks.len());
            if !file_chunks.is_empty() {
                report.files_indexed += 1;
            }
            report.fallback_chunks += file_chunks.iter().filter(|c| c.is_fallback()).count();
            chunks.extend(file_chunks);
        }

        if chunks.is_empty() {
            tracing::warn!(files = report.files_scanned, "no chunks generated from code files");
            return Ok(BuildOutcome::EmptyCorpus {
                files_scanned: report.files_scanned,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text().to_owned()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(IndexError::Consistency {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }

        let index = FlatL2Index::build(&vectors)?;
        let corpus = Corpus::new(chunks, index)?;
        self.store.save(&corpus).await?;

        report.chunks_created = corpus.len();
        *self.corpus.write().await = Some(Arc::new(corpus));

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            chunks = report.chunks_created,
            files = report.files_scanned,
            skipped = report.errors.len(),
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(BuildOutcome::Built(report))
    }

    /// Restore the persisted corpus into memory.
    ///
    /// # Errors
    ///
    /// Returns `NotBuilt` if either artifact is missing and `Consistency` if
    /// they disagree in size.
    pub async fn load(&self) -> Result<Arc<Corpus>> {
        let _guard = self.write_lock.lock().await;
        let corpus = Arc::new(self.store.load().await?);
        *self.corpus.write().await = Some(Arc::clone(&corpus));
        tracing::info!(chunks = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// Load the persisted corpus, building from `base_path` when none exists.
    ///
    /// # Errors
    ///
    /// Propagates any load error other than `NotBuilt`, and build errors.
    pub async fn load_or_build(&self, base_path: &Path) -> Result<Startup> {
        match self.load().await {
            Ok(corpus) => Ok(Startup::Loaded {
                chunks: corpus.len(),
            }),
            Err(IndexError::NotBuilt) => {
                tracing::info!("no corpus found, building a new one");
                Ok(Startup::Built(self.process_and_store(base_path).await?))
            }
            Err(e) => Err(e),
        }
    }

    /// Top-`k` chunk records for `query`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for an empty query or `k == 0` (the embedder is
    /// not called), `NotBuilt` when no corpus is in memory, or an embedding
    /// or search error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ChunkRecord>> {
        if query.trim().is_empty() {
            return Err(IndexError::InvalidQuery("query text is empty".into()));
        }
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be positive".into()));
        }

        let corpus = self
            .corpus
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(IndexError::NotBuilt)?;

        let query_vector = self.embedder.embed(query).await?;
        corpus.nearest(&query_vector, k)
    }

    /// Drop the in-memory corpus and delete both artifacts. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing artifact cannot be deleted.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        *self.corpus.write().await = None;
        let removed = self.store.remove().await?;
        tracing::info!(removed, "corpus reset");
        Ok(())
    }

    fn discover(&self, base_path: &Path) -> Vec<PathBuf> {
        ignore::WalkBuilder::new(base_path)
            .hidden(true)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {e}");
                    None
                }
            })
            .filter(|e| {
                e.file_type()
                    .is_some_and(|ft| ft.is_file() || (ft.is_symlink() && !e.path().is_dir()))
                    && self.config.extensions.is_indexable(e.path())
            })
            .map(ignore::DirEntry::into_path)
            .collect()
    }
}

/// File contents with invalid UTF-8 replaced by U+FFFD.
async fn read_source(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
