//! Persisted corpus: JSON chunk list + flat vector index, always handled as a pair.

use std::path::{Path, PathBuf};

use crate::chunker::ChunkRecord;
use crate::error::{IndexError, Result};
use crate::vector_index::FlatL2Index;

/// Chunk records plus the index whose position `i` embeds record `i`.
#[derive(Debug, Clone)]
pub struct Corpus {
    chunks: Vec<ChunkRecord>,
    index: FlatL2Index,
}

impl Corpus {
    /// Pair chunk records with their index.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if the two halves differ in size.
    pub fn new(chunks: Vec<ChunkRecord>, index: FlatL2Index) -> Result<Self> {
        if chunks.len() != index.len() {
            return Err(IndexError::Consistency {
                chunks: chunks.len(),
                vectors: index.len(),
            });
        }
        Ok(Self { chunks, index })
    }

    #[must_use]
    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    #[must_use]
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Nearest `k` records to `query`, closest first.
    ///
    /// Positions outside the chunk list are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector search fails.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ChunkRecord>> {
        let neighbors = self.index.search(query, k)?;
        Ok(neighbors
            .into_iter()
            .filter_map(|n| self.chunks.get(n.position).cloned())
            .collect())
    }
}

/// Fixed pair of artifact paths backing one corpus.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    chunks_path: PathBuf,
    index_path: PathBuf,
}

impl CorpusStore {
    #[must_use]
    pub fn new(chunks_path: PathBuf, index_path: PathBuf) -> Self {
        Self {
            chunks_path,
            index_path,
        }
    }

    /// Store with both artifacts under `dir` using the given file names.
    #[must_use]
    pub fn in_dir(dir: &Path, chunks_file: &str, index_file: &str) -> Self {
        Self::new(dir.join(chunks_file), dir.join(index_file))
    }

    #[must_use]
    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Whether both artifacts are present.
    pub async fn exists(&self) -> bool {
        file_exists(&self.chunks_path).await && file_exists(&self.index_path).await
    }

    /// Write both artifacts, creating parent directories as needed.
    ///
    /// Both halves are staged as `<name>.tmp` siblings and renamed into place only
    /// once both writes succeed, so a failed save leaves the previous pair.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any write fails.
    pub async fn save(&self, corpus: &Corpus) -> Result<()> {
        for path in [&self.chunks_path, &self.index_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(&corpus.chunks)?;
        let chunks_tmp = staged_path(&self.chunks_path);
        let index_tmp = staged_path(&self.index_path);

        let staged: Result<()> = async {
            tokio::fs::write(&chunks_tmp, json).await?;
            corpus.index.persist(&index_tmp).await
        }
        .await;
        if let Err(e) = staged {
            discard(&chunks_tmp).await;
            discard(&index_tmp).await;
            return Err(e);
        }

        tokio::fs::rename(&chunks_tmp, &self.chunks_path).await?;
        tokio::fs::rename(&index_tmp, &self.index_path).await?;

        tracing::debug!(
            chunks = %self.chunks_path.display(),
            index = %self.index_path.display(),
            "corpus persisted"
        );
        Ok(())
    }

    /// Read both artifacts back into a corpus.
    ///
    /// # Errors
    ///
    /// Returns `NotBuilt` if either artifact is missing, `Consistency` if the
    /// halves disagree, or an IO/decoding error.
    pub async fn load(&self) -> Result<Corpus> {
        if !self.exists().await {
            return Err(IndexError::NotBuilt);
        }

        let json = tokio::fs::read_to_string(&self.chunks_path).await?;
        let chunks: Vec<ChunkRecord> = serde_json::from_str(&json)?;
        let index = FlatL2Index::restore(&self.index_path).await?;

        Corpus::new(chunks, index)
    }

    /// Delete both artifacts if present. Returns how many files were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing artifact cannot be removed.
    pub async fn remove(&self) -> Result<usize> {
        let mut removed = 0;
        for path in [&self.chunks_path, &self.index_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "deleted corpus artifact");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), "could not remove staged file: {e}");
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
