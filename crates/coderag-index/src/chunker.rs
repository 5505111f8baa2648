//! Line-oriented chunking: declaration header plus brace block, with a
//! fixed-window fallback for files where no block is found.
//!
//! Accepted header shapes: the trimmed line starts with an identifier
//! character, followed by identifier characters, whitespace, `*`, `[`, `]`
//! or `,`, then a parenthesised parameter list (`int main(void)`,
//! `static char *buf[](int n)`, `def run(self):`). Anything may follow the
//! closing parenthesis. Lines opening with punctuation (`#include`, `}`,
//! `// foo()`) are rejected.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Signature assigned to fixed-window chunks.
pub const FALLBACK_SIGNATURE: &str = "fallback";

static DECLARATION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][\w\s\*\[\],]*\([^)]*\)\s*\{?").unwrap());

/// One retrievable fragment of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    pub source: String,
    pub start_line: usize,
    pub signature: String,
}

impl ChunkRecord {
    /// Plain text handed to the embedder and the text generator.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.signature == FALLBACK_SIGNATURE
    }
}

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Lines per fallback window (default: 20).
    pub window_lines: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { window_lines: 20 }
    }
}

/// Whether a trimmed line looks like the start of a function or method.
#[must_use]
pub fn is_declaration_header(trimmed: &str) -> bool {
    DECLARATION_HEADER.is_match(trimmed)
}

/// Split one file into chunk records, top to bottom.
///
/// Structural chunks come first; only when none are found is the file cut
/// into non-overlapping windows of `config.window_lines` lines.
#[must_use]
pub fn extract(code: &str, source_path: &str, config: &ChunkerConfig) -> Vec<ChunkRecord> {
    let lines: Vec<&str> = code.lines().collect();
    let mut chunks = extract_structural(&lines, source_path);

    if chunks.is_empty() {
        chunks = extract_windows(&lines, source_path, config.window_lines);
    }
    chunks
}

fn extract_structural(lines: &[&str], source_path: &str) -> Vec<ChunkRecord> {
    let mut chunks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let header = lines[i].trim();
        if !is_declaration_header(header) {
            i += 1;
            continue;
        }

        let mut signature = header.to_string();
        let mut brace_line = i;
        while brace_line < lines.len() && !lines[brace_line].contains('{') {
            if brace_line > i {
                signature.push(' ');
                signature.push_str(lines[brace_line].trim());
            }
            brace_line += 1;
        }

        if brace_line == lines.len() {
            i += 1;
            continue;
        }

        let (content, end) = collect_block(lines, brace_line);
        chunks.push(ChunkRecord {
            content,
            source: source_path.to_string(),
            start_line: i,
            signature,
        });
        i = end;
    }

    chunks
}

/// Collect raw lines from `start` until brace depth returns to zero.
///
/// Returns the joined block and the index of the first line after it. An
/// unterminated block runs to end of input.
fn collect_block(lines: &[&str], start: usize) -> (String, usize) {
    let mut depth: i64 = 0;
    let mut end = start;

    while end < lines.len() {
        let line = lines[end];
        depth += brace_delta(line);
        end += 1;
        if depth == 0 {
            break;
        }
    }

    (lines[start..end].join("\n"), end)
}

fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '{' => acc + 1,
        '}' => acc - 1,
        _ => acc,
    })
}

fn extract_windows(lines: &[&str], source_path: &str, window_lines: usize) -> Vec<ChunkRecord> {
    let window_lines = window_lines.max(1);
    lines
        .chunks(window_lines)
        .enumerate()
        .filter_map(|(n, window)| {
            let content = window.join("\n").trim().to_string();
            (!content.is_empty()).then(|| ChunkRecord {
                content,
                source: source_path.to_string(),
                start_line: n * window_lines,
                signature: FALLBACK_SIGNATURE.to_string(),
            })
        })
        .collect()
}
