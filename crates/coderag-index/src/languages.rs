//! Supported-language allow-list for corpus discovery.

use std::path::Path;

/// Default file extensions picked up by a build.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "c", "cpp", "h", "hpp", "py", "java", "js", "ts", "tsx", "cs", "go", "php", "rb", "swift",
];

/// Case-insensitive extension filter.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    #[must_use]
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Whether this path should be chunked.
    #[must_use]
    pub fn is_indexable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}
