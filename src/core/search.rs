//! Provides name and extension lookups over a scanned tree.

use super::node::{FileTree, NodeId};

/// A utility struct for searching a `FileTree`.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Returns every node whose name contains `keyword`, ignoring case.
    ///
    /// Results are in pre-order: a node before its children, children left
    /// to right. An empty keyword matches every node.
    pub fn search(tree: &FileTree, keyword: &str) -> Vec<NodeId> {
        let keyword_lower = keyword.to_lowercase();
        tree.preorder()
            .filter(|id| tree.node(*id).name().to_lowercase().contains(&keyword_lower))
            .collect()
    }

    /// Returns files whose extension matches `extension_filter`.
    ///
    /// The leading dot is optional and case is ignored. `"no extension"`
    /// selects files without one.
    pub fn filter_by_extension(tree: &FileTree, extension_filter: &str) -> Vec<NodeId> {
        let wanted = extension_filter
            .strip_prefix('.')
            .unwrap_or(extension_filter)
            .to_lowercase();
        let no_extension = extension_filter.eq_ignore_ascii_case("no extension");

        tree.preorder()
            .filter(|id| {
                let node = tree.node(*id);
                if node.is_directory() {
                    return false;
                }
                match node.extension() {
                    Some(ext) => !no_extension && ext[1..] == wanted,
                    None => no_extension,
                }
            })
            .collect()
    }
}
