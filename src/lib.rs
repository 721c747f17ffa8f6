//! Scan a project directory into an annotated tree, filtered by
//! gitignore-style rules.

pub mod config;
pub mod core;
pub mod utils;

pub use crate::core::{
    DiagnosticSink, DirectoryScanner, FileTree, FilterEngine, Node, NodeId, ScanIssue, ScanResult,
    SearchEngine, TreeStatistics,
};
