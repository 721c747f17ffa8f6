//! The scanning and filtering engine.

pub mod error;
pub mod ignore;
pub mod node;
pub mod project;
pub mod scanner;
pub mod search;
pub mod statistics;

pub use error::{CoreError, ScanIssue};
pub use ignore::{common_ignore_patterns, FilterEngine, PatternRule, IGNORE_FILE_NAME};
pub use node::{FileTree, Node, NodeId};
pub use project::ProjectModel;
pub use scanner::{
    scan_directory, CollectingSink, DiagnosticSink, DirectoryScanner, NullSink, ScanResult,
    TracingSink,
};
pub use search::SearchEngine;
pub use statistics::{format_file_size, TreeStatistics, NO_EXTENSION_KEY};
