use super::error::{CoreError, ScanIssue};
use super::ignore::FilterEngine;
use super::node::{FileTree, NodeId};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// Receives non-fatal problems found while scanning.
///
/// Implementations must not block or fail; the scan continues regardless.
pub trait DiagnosticSink {
    fn report(&self, issue: &ScanIssue);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&ScanIssue),
{
    fn report(&self, issue: &ScanIssue) {
        self(issue)
    }
}

/// Forwards every issue to `tracing` as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, issue: &ScanIssue) {
        tracing::warn!("{}", issue);
    }
}

/// Drops every issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _issue: &ScanIssue) {}
}

/// Keeps every issue in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    issues: Mutex<Vec<ScanIssue>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> Vec<ScanIssue> {
        self.issues
            .lock()
            .map(|issues| issues.clone())
            .unwrap_or_default()
    }

    pub fn into_issues(self) -> Vec<ScanIssue> {
        self.issues.into_inner().unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, issue: &ScanIssue) {
        if let Ok(mut issues) = self.issues.lock() {
            issues.push(issue.clone());
        }
    }
}

/// The outcome of one scan call.
///
/// A later scan never touches an earlier result; it builds a new tree.
#[derive(Debug, Clone)]
pub struct ScanResult {
    tree: FileTree,
    extra_patterns: Vec<String>,
    patterns: Vec<String>,
    use_ignore_file: bool,
    diagnostics: Vec<ScanIssue>,
    scanned_at: DateTime<Local>,
}

impl ScanResult {
    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn into_tree(self) -> FileTree {
        self.tree
    }

    /// Canonical path of the scanned root.
    pub fn root_path(&self) -> &Path {
        self.tree.root_node().path()
    }

    /// Caller-supplied patterns, as passed to the scan.
    pub fn extra_patterns(&self) -> &[String] {
        &self.extra_patterns
    }

    /// Caller patterns followed by ignore-file patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn use_ignore_file(&self) -> bool {
        self.use_ignore_file
    }

    /// Problems reported during the scan, in encounter order.
    pub fn diagnostics(&self) -> &[ScanIssue] {
        &self.diagnostics
    }

    pub fn scanned_at(&self) -> DateTime<Local> {
        self.scanned_at
    }

    /// Annotates a node. Descriptions are the only mutable part of a result.
    pub fn set_description(&mut self, id: NodeId, description: impl Into<String>) -> bool {
        self.tree.set_description(id, description)
    }

    /// Scans the same root again with the same inputs, producing a new result.
    pub fn rescan(&self, sink: &dyn DiagnosticSink) -> Result<ScanResult, CoreError> {
        DirectoryScanner::new().scan(
            self.root_path(),
            &self.extra_patterns,
            self.use_ignore_file,
            sink,
        )
    }
}

/// Walks a directory and materializes the filtered tree.
#[derive(Debug, Default)]
pub struct DirectoryScanner {
    engine: FilterEngine,
}

impl DirectoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine as configured by the most recent scan.
    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// Scans with diagnostics routed to `tracing`.
    pub fn scan_with_defaults(
        &mut self,
        root_path: &Path,
        extra_patterns: &[String],
        use_ignore_file: bool,
    ) -> Result<ScanResult, CoreError> {
        self.scan(root_path, extra_patterns, use_ignore_file, &TracingSink)
    }

    /// Builds the tree under `root_path`.
    ///
    /// Fails only when the root does not exist or is not a directory. Any
    /// problem below the root is reported to `sink`, recorded in the result,
    /// and leaves the affected directory childless.
    pub fn scan(
        &mut self,
        root_path: &Path,
        extra_patterns: &[String],
        use_ignore_file: bool,
        sink: &dyn DiagnosticSink,
    ) -> Result<ScanResult, CoreError> {
        let root = fs::canonicalize(root_path)
            .map_err(|_| CoreError::InvalidPath(root_path.to_path_buf()))?;
        if !root.is_dir() {
            return Err(CoreError::InvalidPath(root_path.to_path_buf()));
        }

        let mut patterns = extra_patterns.to_vec();
        if use_ignore_file {
            patterns.extend(FilterEngine::load_ignore_file(&root));
        }
        self.engine.configure(&patterns);

        tracing::info!(
            "Scanning {:?} with {} patterns (ignore file: {})",
            root,
            patterns.len(),
            use_ignore_file
        );

        let root_name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let mut builder = TreeBuilder {
            engine: &self.engine,
            root: &root,
            sink,
            tree: FileTree::new(root_name, root.clone()),
            diagnostics: Vec::new(),
        };
        let root_id = builder.tree.root();
        builder.expand(root_id, &root, &mut Vec::new());
        let TreeBuilder {
            tree, diagnostics, ..
        } = builder;

        tracing::info!(
            "Scan completed: {} nodes, {} issues",
            tree.node_count(),
            diagnostics.len()
        );

        Ok(ScanResult {
            tree,
            extra_patterns: extra_patterns.to_vec(),
            patterns,
            use_ignore_file,
            diagnostics,
            scanned_at: Local::now(),
        })
    }
}

/// Tree and issues of one scan in progress.
struct TreeBuilder<'a> {
    engine: &'a FilterEngine,
    root: &'a Path,
    sink: &'a dyn DiagnosticSink,
    tree: FileTree,
    diagnostics: Vec<ScanIssue>,
}

impl TreeBuilder<'_> {
    fn report(&mut self, issue: ScanIssue) {
        self.sink.report(&issue);
        self.diagnostics.push(issue);
    }

    /// Attaches the retained contents of `dir` under `parent`.
    ///
    /// The walk itself never follows links, so an excluded link is dropped
    /// without being resolved. Retained links are classified through their
    /// target; a dangling link is a file.
    fn expand(&mut self, parent: NodeId, dir: &Path, linked: &mut Vec<PathBuf>) {
        let engine = self.engine;
        let root = self.root;
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .follow_root_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !engine.should_exclude(entry.path(), root));

        // open_dirs[d] is the node of the directory currently expanded at depth d.
        let mut open_dirs: Vec<NodeId> = vec![parent];
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.report(issue_from_walk_error(&e, dir));
                    continue;
                }
            };

            let depth = entry.depth();
            if depth == 0 {
                continue;
            }

            open_dirs.truncate(depth);
            let Some(&entry_parent) = open_dirs.get(depth - 1) else {
                continue;
            };

            let is_link = entry.path_is_symlink();
            let is_directory = if is_link {
                entry.path().is_dir()
            } else {
                entry.file_type().is_dir()
            };
            let id = self.tree.add_child(
                entry_parent,
                entry.file_name().to_string_lossy().into_owned(),
                entry.path(),
                is_directory,
            );

            if is_link && is_directory {
                self.expand_link(id, entry.path(), linked);
            } else if is_directory {
                open_dirs.push(id);
            }
        }
    }

    /// Expands a retained link to a directory, unless its target contains the
    /// link or a directory already being expanded through a link.
    fn expand_link(&mut self, id: NodeId, link: &Path, linked: &mut Vec<PathBuf>) {
        let target = match fs::canonicalize(link) {
            Ok(target) => target,
            Err(e) => {
                self.report(ScanIssue::Io {
                    path: link.to_path_buf(),
                    message: e.to_string(),
                });
                return;
            }
        };

        let link_dir = link.parent().and_then(|parent| fs::canonicalize(parent).ok());
        if link_dir
            .iter()
            .chain(linked.iter())
            .any(|dir| dir.starts_with(&target))
        {
            self.report(ScanIssue::Io {
                path: link.to_path_buf(),
                message: format!(
                    "File system loop found: {} points to an ancestor {}",
                    link.display(),
                    target.display()
                ),
            });
            return;
        }

        let mark = linked.len();
        linked.extend(link_dir);
        linked.push(target);
        self.expand(id, link, linked);
        linked.truncate(mark);
    }
}

fn issue_from_walk_error(error: &walkdir::Error, root: &Path) -> ScanIssue {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    match error.io_error() {
        Some(io) if io.kind() == ErrorKind::PermissionDenied => ScanIssue::PermissionDenied { path },
        _ => ScanIssue::Io {
            path,
            message: error.to_string(),
        },
    }
}

/// Convenience for callers holding a root path and plain string patterns.
pub fn scan_directory(
    root_path: impl AsRef<Path>,
    extra_patterns: &[&str],
    use_ignore_file: bool,
    sink: &dyn DiagnosticSink,
) -> Result<ScanResult, CoreError> {
    let patterns: Vec<String> = extra_patterns.iter().map(|p| p.to_string()).collect();
    DirectoryScanner::new().scan(root_path.as_ref(), &patterns, use_ignore_file, sink)
}

/// Looks up the node at a root-relative path.
pub fn resolve_relative(result: &ScanResult, relative: impl AsRef<Path>) -> Option<NodeId> {
    let absolute: PathBuf = result.root_path().join(relative);
    result.tree().find_by_path(&absolute)
}
