//! End-to-end scans over temporary project trees.

use ignister::config::ScanConfig;
use ignister::core::{
    scan_directory, CollectingSink, CoreError, DirectoryScanner, FileTree, NullSink, ScanIssue,
    ScanResult, SearchEngine, TracingSink, TreeStatistics,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_test::traced_test;

/// Contains the test infrastructure.
mod helpers {
    use super::*;

    /// An isolated project directory that is removed when dropped.
    pub struct TestProject {
        pub root_path: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestProject {
        pub fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().to_path_buf();
            Self {
                root_path,
                _temp_dir: temp_dir,
            }
        }

        /// Creates a file inside the project, including parent directories.
        pub fn create_file(&self, path: &str, content: &str) {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(file_path, content).expect("Failed to write file");
        }

        pub fn create_dir(&self, path: &str) {
            fs::create_dir_all(self.root_path.join(path)).expect("Failed to create dir");
        }

        pub fn setup_basic_project(&self) {
            self.create_file("src/main.rs", "fn main() {}");
            self.create_file("src/lib.rs", "// Library code");
            self.create_file("src/Maintenance.py", "print('x')");
            self.create_file("README.md", "# My Project");
            self.create_file("Cargo.toml", "[package]\nname = \"test\"");
            self.create_file("docs/guide.txt", "User guide content");
            self.create_file("logs/error.log", "boom");
            self.create_file("logs/keep.log", "keep");
            self.create_file("node_modules/left-pad/index.js", "module.exports = 1;");
            self.create_file("node_modules/left-pad/README", "docs");
            self.create_file("build/out.bin", "bin");
            self.create_file("src/build/generated.rs", "// generated");
        }

        pub fn scan(&self, patterns: &[&str], use_ignore_file: bool) -> ScanResult {
            scan_directory(&self.root_path, patterns, use_ignore_file, &NullSink)
                .expect("Scan failed")
        }
    }

    /// Root-relative paths in pre-order, root excluded. Directories end in `/`.
    pub fn listing(tree: &FileTree) -> Vec<String> {
        tree.preorder()
            .skip(1)
            .map(|id| {
                let relative = tree.relative_path(id).to_string_lossy().replace('\\', "/");
                if tree.node(id).is_directory() {
                    format!("{relative}/")
                } else {
                    relative
                }
            })
            .collect()
    }

    /// Names and directory flags in pre-order.
    pub fn shape(tree: &FileTree) -> Vec<(String, bool)> {
        tree.preorder()
            .map(|id| {
                let node = tree.node(id);
                (node.name().to_string(), node.is_directory())
            })
            .collect()
    }

    /// Integration tests link the library without `cfg(test)`, and `libc` is a
    /// dev-dependency, so this cannot come from `utils::test_helpers`.
    #[cfg(unix)]
    pub fn running_as_root() -> bool {
        // SAFETY: geteuid has no side effects and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
}

use helpers::{listing, shape, TestProject};

#[test]
fn test_scan_without_patterns_lists_everything_sorted() {
    let project = TestProject::new();
    project.create_file("b.txt", "");
    project.create_file("a/inner.txt", "");
    project.create_file(".hidden", "");

    let result = project.scan(&[], false);
    insta::assert_snapshot!(listing(result.tree()).join("\n"), @r"
    .hidden
    a/
    a/inner.txt
    b.txt
    ");
}

#[test]
fn test_statistics_agree_with_node_count() {
    let project = TestProject::new();
    project.setup_basic_project();

    let result = project.scan(&["*.log"], false);
    let tree = result.tree();
    let stats = TreeStatistics::collect(tree);

    assert_eq!(stats.directories + stats.files, tree.node_count());
    assert_eq!(stats.extensions.get(".log"), None);
    assert_eq!(stats.extensions.get(".rs"), Some(&3));
    assert!(stats.total_size > 0);
}

#[test]
fn test_rescan_is_idempotent_and_independent() {
    let project = TestProject::new();
    project.setup_basic_project();

    let mut first = project.scan(&["node_modules/"], false);
    let second = project.scan(&["node_modules/"], false);
    assert_eq!(shape(first.tree()), shape(second.tree()));

    let root = first.tree().root();
    assert!(first.set_description(root, "annotated"));
    assert_eq!(first.tree().node(root).description(), "annotated");

    let third = first.rescan(&NullSink).unwrap();
    assert_eq!(shape(third.tree()), shape(second.tree()));
    assert!(third
        .tree()
        .preorder()
        .all(|id| third.tree().node(id).description().is_empty()));
}

#[test]
fn test_log_pattern_excludes_logs_at_any_depth() {
    let project = TestProject::new();
    project.create_file("a.log", "");
    project.create_file("sub/dir/b.log", "");
    project.create_file("alog.txt", "");

    let result = project.scan(&["*.log"], false);
    assert_eq!(listing(result.tree()), vec!["alog.txt", "sub/", "sub/dir/"]);
}

#[test]
fn test_anchored_pattern_only_excludes_top_level() {
    let project = TestProject::new();
    project.setup_basic_project();

    let result = project.scan(&["/build", "node_modules/", "logs/"], false);
    let paths = listing(result.tree());
    assert!(!paths.contains(&"build/".to_string()));
    assert!(paths.contains(&"src/build/".to_string()));
    assert!(paths.contains(&"src/build/generated.rs".to_string()));
}

#[test]
fn test_negated_pattern_keeps_file() {
    let project = TestProject::new();
    project.setup_basic_project();

    let result = project.scan(&["*.log", "!keep.log"], false);
    let paths = listing(result.tree());
    assert!(paths.contains(&"logs/keep.log".to_string()));
    assert!(!paths.contains(&"logs/error.log".to_string()));
}

#[test]
fn test_gitignore_negation_overrides_caller_pattern() {
    let project = TestProject::new();
    project.setup_basic_project();
    project.create_file(".gitignore", "# local\nnode_modules/\n!keep.log\n");

    let result = project.scan(&["*.log"], true);
    assert_eq!(result.patterns(), ["*.log", "node_modules/", "!keep.log"]);

    let paths = listing(result.tree());
    assert!(paths.contains(&"logs/keep.log".to_string()));
    assert!(!paths.contains(&"logs/error.log".to_string()));
    assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
}

#[test]
fn test_excluded_directory_descendants_never_appear() {
    let project = TestProject::new();
    project.setup_basic_project();

    let result = project.scan(&["node_modules/"], false);
    let tree = result.tree();
    assert!(listing(tree).iter().all(|p| !p.contains("node_modules")));
    assert!(SearchEngine::search(tree, "left-pad").is_empty());
    assert!(SearchEngine::search(tree, "index").is_empty());
}

#[cfg(unix)]
#[test]
fn test_excluded_directory_is_never_opened() {
    use std::os::unix::fs::PermissionsExt;

    // Root can open a 0o000 directory, so pruning would go unobserved.
    if helpers::running_as_root() {
        return;
    }

    let project = TestProject::new();
    project.create_file("cache/blob", "");
    project.create_file("src/app.rs", "");
    let cache = project.root_path.join("cache");
    fs::set_permissions(&cache, fs::Permissions::from_mode(0o000)).unwrap();

    let sink = CollectingSink::new();
    let result = scan_directory(&project.root_path, &["cache/"], false, &sink);
    fs::set_permissions(&cache, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(listing(result.unwrap().tree()), vec!["src/", "src/app.rs"]);
    assert!(sink.issues().is_empty());
}

#[test]
fn test_depth_of_flat_and_empty_directories() {
    let project = TestProject::new();
    project.create_dir("empty");
    project.create_file("flat/a.txt", "");
    project.create_file("flat/b.txt", "");

    let flat = scan_directory(project.root_path.join("flat"), &[], false, &NullSink).unwrap();
    assert_eq!(flat.tree().depth(), 2);
    assert_eq!(flat.tree().node_count(), 3);

    let empty = scan_directory(project.root_path.join("empty"), &[], false, &NullSink).unwrap();
    assert_eq!(empty.tree().depth(), 1);
    assert_eq!(empty.tree().node_count(), 1);
}

#[test]
fn test_search_finds_substrings_in_preorder() {
    let project = TestProject::new();
    project.setup_basic_project();

    let result = project.scan(&["node_modules/"], false);
    let tree = result.tree();
    let found: Vec<String> = SearchEngine::search(tree, "main")
        .into_iter()
        .map(|id| tree.node(id).name().to_string())
        .collect();
    assert_eq!(found, vec!["Maintenance.py", "main.rs"]);
}

#[cfg(unix)]
#[test]
fn test_permission_failure_yields_childless_node_and_diagnostic() {
    use std::os::unix::fs::PermissionsExt;

    if helpers::running_as_root() {
        return;
    }

    let project = TestProject::new();
    project.create_file("a_open/one.txt", "");
    project.create_file("b_locked/hidden.txt", "");
    project.create_file("c_open/two.txt", "");
    let locked = project.root_path.join("b_locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let sink = CollectingSink::new();
    let result = scan_directory(&project.root_path, &[], false, &sink);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let result = result.expect("Scan must survive unreadable subdirectories");

    assert_eq!(
        listing(result.tree()),
        vec!["a_open/", "a_open/one.txt", "b_locked/", "c_open/", "c_open/two.txt"]
    );
    let issues = sink.into_issues();
    assert_eq!(issues.len(), 1);
    assert!(matches!(&issues[0], ScanIssue::PermissionDenied { path } if path.ends_with("b_locked")));
    assert_eq!(result.diagnostics(), issues.as_slice());
}

#[cfg(unix)]
#[traced_test]
#[test]
fn test_dangling_symlink_is_kept_as_file() {
    let project = TestProject::new();
    project.create_file("real.txt", "");
    std::os::unix::fs::symlink(
        project.root_path.join("missing-target"),
        project.root_path.join("dangling"),
    )
    .unwrap();

    let result = DirectoryScanner::new()
        .scan(&project.root_path, &[], false, &TracingSink)
        .unwrap();

    assert_eq!(listing(result.tree()), vec!["dangling", "real.txt"]);
    assert!(result.diagnostics().is_empty());
    let stats = TreeStatistics::collect(result.tree());
    assert_eq!(stats.files, 2);
    assert!(logs_contain("Scan completed: 3 nodes, 0 issues"));
}

#[cfg(unix)]
#[traced_test]
#[test]
fn test_symlink_loop_is_reported_and_left_childless() {
    let project = TestProject::new();
    project.create_file("pkg/mod.rs", "");
    std::os::unix::fs::symlink(project.root_path.join("pkg"), project.root_path.join("pkg/again"))
        .unwrap();

    let result = DirectoryScanner::new()
        .scan(&project.root_path, &[], false, &TracingSink)
        .unwrap();

    assert_eq!(listing(result.tree()), vec!["pkg/", "pkg/again/", "pkg/mod.rs"]);
    assert_eq!(result.diagnostics().len(), 1);
    assert!(matches!(&result.diagnostics()[0], ScanIssue::Io { path, .. } if path.ends_with("again")));
    assert!(logs_contain("Failed to read"));
    assert!(logs_contain("File system loop found"));
    assert!(logs_contain("Scan completed: 4 nodes, 1 issues"));
}

#[cfg(unix)]
#[test]
fn test_excluded_symlinks_produce_no_diagnostics() {
    let project = TestProject::new();
    project.create_file("src/app.rs", "");
    std::os::unix::fs::symlink(project.root_path.join("gone"), project.root_path.join("old.lnk"))
        .unwrap();
    std::os::unix::fs::symlink(project.root_path.join("src"), project.root_path.join("src/loop"))
        .unwrap();

    let sink = CollectingSink::new();
    let result = scan_directory(&project.root_path, &["*.lnk", "loop"], false, &sink).unwrap();

    assert_eq!(listing(result.tree()), vec!["src/", "src/app.rs"]);
    assert!(sink.issues().is_empty());
    assert!(result.diagnostics().is_empty());
}

#[test]
fn test_invalid_root_is_the_only_fatal_error() {
    let project = TestProject::new();
    project.create_file("plain.txt", "");

    let missing = scan_directory(project.root_path.join("missing"), &[], false, &NullSink);
    assert!(matches!(missing, Err(CoreError::InvalidPath(_))));

    let file_root = scan_directory(project.root_path.join("plain.txt"), &[], false, &NullSink);
    assert!(matches!(file_root, Err(CoreError::InvalidPath(_))));
}

#[test]
fn test_structured_record_shape() {
    let project = TestProject::new();
    project.create_file("docs/guide.md", "");

    let mut result = project.scan(&[], false);
    let docs = ignister::core::scanner::resolve_relative(&result, "docs").unwrap();
    result.set_description(docs, "User documentation");

    let value = serde_json::to_value(result.tree()).unwrap();
    let docs_record = &value["children"][0];
    assert_eq!(docs_record["name"], "docs");
    assert_eq!(docs_record["is_directory"], true);
    assert_eq!(docs_record["description"], "User documentation");
    assert_eq!(docs_record["children"][0]["name"], "guide.md");
    assert_eq!(docs_record["children"][0]["children"], serde_json::json!([]));

    let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["children", "description", "is_directory", "name", "path"]);
    assert_eq!(
        Path::new(value["path"].as_str().unwrap()),
        result.root_path()
    );
}

#[test]
fn test_config_defaults_drive_a_scan() {
    let project = TestProject::new();
    project.setup_basic_project();
    project.create_file(".git/HEAD", "ref: refs/heads/main");

    let config = ScanConfig::default();
    let result = config.scan(&project.root_path, &NullSink).unwrap();
    let paths = listing(result.tree());

    assert!(!paths.iter().any(|p| p.starts_with(".git")));
    assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
    assert!(!paths.iter().any(|p| p.ends_with(".log")));
    // "build/" is unanchored in the defaults, so nested build dirs go too.
    assert!(!paths.iter().any(|p| p.contains("build")));
    assert!(paths.contains(&"src/main.rs".to_string()));
}
