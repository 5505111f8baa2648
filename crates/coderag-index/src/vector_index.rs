//! Brute-force L2 nearest-neighbor index with a compact binary file format.
//!
//! Layout (little-endian): magic `CRFL`, `u32` version, `u32` dimension,
//! `u64` vector count, then `count * dimension` `f32` values in position order.
//! [`crate::store::CorpusStore`] stages this file together with the chunk list.

use std::path::Path;

use crate::error::{IndexError, Result};

const MAGIC: &[u8; 4] = b"CRFL";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// One search result: index position and squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Flat vector index. Position `i` always holds the `i`-th vector given to `build`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build a fresh index containing exactly `vectors`, in order.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the vectors differ in length.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let dimension = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(dimension * vectors.len());

        for vector in vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimension, data })
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` nearest vectors by ascending distance; ties keep position order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` when the index holds no vectors, `InvalidQuery`
    /// for `k == 0`, and `DimensionMismatch` for a query of the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be positive".into()));
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Encode into the on-disk binary form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        #[allow(clippy::cast_possible_truncation)]
        buffer.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        buffer.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        buffer
    }

    /// Decode an index previously produced by [`Self::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns `Format` if the header or payload is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::Format("file too short".into()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(IndexError::Format("invalid magic".into()));
        }

        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(IndexError::Format(format!(
                "unsupported format version {version}"
            )));
        }

        let dimension = usize::try_from(read_u32(&bytes[8..12]))
            .map_err(|e| IndexError::Format(e.to_string()))?;
        let count = usize::try_from(read_u64(&bytes[12..20]))
            .map_err(|e| IndexError::Format(e.to_string()))?;

        let values = dimension
            .checked_mul(count)
            .ok_or_else(|| IndexError::Format("vector count overflow".into()))?;
        let payload_len = values
            .checked_mul(4)
            .ok_or_else(|| IndexError::Format("vector count overflow".into()))?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != payload_len {
            return Err(IndexError::Format(format!(
                "expected {values} values, found {} bytes",
                payload.len()
            )));
        }
        if dimension == 0 && count > 0 {
            return Err(IndexError::Format("zero dimension with vectors".into()));
        }

        let data = payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self { dimension, data })
    }

    /// Write the encoded index to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn persist(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.to_bytes()).await?;
        Ok(())
    }

    /// Read an index from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn restore(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(&bytes)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
