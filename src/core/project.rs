//! The caller-side record of a project: where it lives, how it is filtered,
//! and the tree from the last scan.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::scanner::{DiagnosticSink, DirectoryScanner, ScanResult};

#[derive(Debug, Clone, Default)]
pub struct ProjectModel {
    project_path: PathBuf,
    filter_conditions: Vec<String>,
    use_gitignore: bool,
    last_scan: Option<ScanResult>,
}

impl ProjectModel {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            ..Self::default()
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn set_project_path(&mut self, path: impl Into<PathBuf>) {
        self.project_path = path.into();
    }

    pub fn filter_conditions(&self) -> &[String] {
        &self.filter_conditions
    }

    /// Appends a condition. Empty and duplicate conditions are ignored.
    pub fn add_filter_condition(&mut self, condition: impl Into<String>) -> bool {
        let condition = condition.into();
        if condition.trim().is_empty() || self.filter_conditions.contains(&condition) {
            return false;
        }
        self.filter_conditions.push(condition);
        true
    }

    pub fn remove_filter_condition(&mut self, condition: &str) -> bool {
        let before = self.filter_conditions.len();
        self.filter_conditions.retain(|existing| existing != condition);
        self.filter_conditions.len() != before
    }

    pub fn clear_filter_conditions(&mut self) {
        self.filter_conditions.clear();
    }

    pub fn use_gitignore(&self) -> bool {
        self.use_gitignore
    }

    pub fn set_use_gitignore(&mut self, use_gitignore: bool) {
        self.use_gitignore = use_gitignore;
    }

    pub fn last_scan(&self) -> Option<&ScanResult> {
        self.last_scan.as_ref()
    }

    pub fn last_scan_mut(&mut self) -> Option<&mut ScanResult> {
        self.last_scan.as_mut()
    }

    /// Scans the project with its current settings and keeps the result.
    ///
    /// On failure the previous result is left in place.
    pub fn scan(&mut self, sink: &dyn DiagnosticSink) -> Result<&ScanResult, CoreError> {
        let result = DirectoryScanner::new().scan(
            &self.project_path,
            &self.filter_conditions,
            self.use_gitignore,
            sink,
        )?;
        Ok(&*self.last_scan.insert(result))
    }

    /// `{project_path, filter_conditions, use_gitignore, structure}`, where
    /// `structure` is the last scanned tree or `null`.
    pub fn to_record(&self) -> Value {
        let structure = self
            .last_scan
            .as_ref()
            .and_then(|scan| serde_json::to_value(scan.tree()).ok())
            .unwrap_or(Value::Null);

        json!({
            "project_path": self.project_path.to_string_lossy(),
            "filter_conditions": self.filter_conditions,
            "use_gitignore": self.use_gitignore,
            "structure": structure,
        })
    }
}
