pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{common_ignore_patterns, CoreError, DiagnosticSink, DirectoryScanner, ScanResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Evaluated in order; the last matching pattern wins.
    pub ignore_patterns: Vec<String>,
    pub use_gitignore: bool,
    pub last_directory: Option<PathBuf>,
}

impl ScanConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// Scans `root` with this configuration's patterns and ignore-file flag.
    pub fn scan(&self, root: &Path, sink: &dyn DiagnosticSink) -> Result<ScanResult, CoreError> {
        DirectoryScanner::new().scan(root, &self.ignore_patterns, self.use_gitignore, sink)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: common_ignore_patterns(),
            use_gitignore: false,
            last_directory: None,
        }
    }
}
