//! Code chunking, flat vector indexing, and retrieval over a source tree.
//!
//! Source files are split into chunk records by a declaration-plus-brace
//! heuristic with a fixed-window fallback, embedded in one batch, and stored
//! as a pair of artifacts: a JSON chunk list and a flat L2 vector index whose
//! position `i` holds the embedding of chunk `i`.

pub mod chunker;
pub mod context;
pub mod error;
pub mod languages;
pub mod pipeline;
pub mod store;
pub mod vector_index;

pub use chunker::{ChunkRecord, ChunkerConfig};
pub use error::{IndexError, Result};
pub use pipeline::{BuildOutcome, IndexReport, Pipeline};
