//! Turning retrieved chunk records into text for display or generation.

use std::fmt::Write;

use crate::chunker::ChunkRecord;

/// Plain-text context for a text generator: record texts separated by a blank line.
#[must_use]
pub fn join_for_generation(chunks: &[ChunkRecord]) -> String {
    chunks
        .iter()
        .map(ChunkRecord::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Short header for one record, e.g. `src/a.c:12 int main(void)`.
#[must_use]
pub fn chunk_display_header(chunk: &ChunkRecord) -> String {
    format!("{}:{} {}", chunk.source, chunk.start_line, chunk.signature)
}

/// Render records with provenance headers for terminal output.
#[must_use]
pub fn format_for_display(chunks: &[ChunkRecord]) -> String {
    let mut out = String::new();
    for (rank, chunk) in chunks.iter().enumerate() {
        let _ = writeln!(out, "--- [{}] {}", rank + 1, chunk_display_header(chunk));
        out.push_str(chunk.text());
        out.push('\n');
    }
    out
}
