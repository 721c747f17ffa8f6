//! Aggregate counts over a scanned tree.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;

use super::node::FileTree;

/// Bucket for files without an extension.
pub const NO_EXTENSION_KEY: &str = "(no extension)";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatistics {
    pub directories: usize,
    pub files: usize,
    /// Sum of file sizes in bytes. Files whose size cannot be read count as 0.
    pub total_size: u64,
    /// Lowercased extension (with leading dot) to number of files.
    pub extensions: BTreeMap<String, usize>,
}

impl TreeStatistics {
    /// Walks the whole tree once. Reads file sizes from disk.
    pub fn collect(tree: &FileTree) -> Self {
        let mut stats = Self::default();

        for id in tree.preorder() {
            let node = tree.node(id);
            if node.is_directory() {
                stats.directories += 1;
                continue;
            }

            stats.files += 1;
            let key = node
                .extension()
                .unwrap_or_else(|| NO_EXTENSION_KEY.to_string());
            *stats.extensions.entry(key).or_insert(0) += 1;

            match fs::metadata(node.path()) {
                Ok(metadata) => stats.total_size += metadata.len(),
                Err(e) => tracing::debug!("Could not read size of {:?}: {}", node.path(), e),
            }
        }

        stats
    }

    /// Total number of nodes counted.
    pub fn total(&self) -> usize {
        self.directories + self.files
    }

    /// Extensions ordered by descending count, then by name.
    pub fn top_extensions(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .extensions
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }
}

/// Formats a byte count as `B`, `KB`, `MB` or `GB` with one decimal.
pub fn format_file_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size_bytes < KB {
        format!("{size_bytes} B")
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else if size_bytes < GB {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", size_bytes as f64 / GB as f64)
    }
}
