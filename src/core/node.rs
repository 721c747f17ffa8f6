//! The in-memory tree produced by a scan.
//!
//! Nodes live in a flat arena owned by [`FileTree`] and refer to each other
//! through [`NodeId`] indices. A child list owns the structure; the parent
//! index is only a back-reference for navigation.

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Index of a node inside the [`FileTree`] that created it.
///
/// An id is only meaningful for the tree it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One file-system entry (file or directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    path: PathBuf,
    is_directory: bool,
    description: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Free-text annotation. Empty after a scan.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn description_mut(&mut self) -> &mut String {
        &mut self.description
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in name order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Lowercased extension including the leading dot, e.g. `".rs"`.
    /// Files like `Makefile` or `.config` have none.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }
}

/// A scanned directory tree. The root always sits at index zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    nodes: Vec<Node>,
}

impl FileTree {
    /// Creates a tree holding only a root directory node.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            nodes: vec![Node {
                name: name.into(),
                path: path.into(),
                is_directory: true,
                description: String::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Appends a child to `parent`. Callers add siblings in name order.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        is_directory: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            path: path.into(),
            is_directory,
            description: String::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different, larger tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Sets the annotation of a node. Returns false if `id` is unknown.
    pub fn set_description(&mut self, id: NodeId, description: impl Into<String>) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.description = description.into();
                true
            }
            None => false,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Walks from the parent of `id` up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// All node ids, node before children, children left to right.
    pub fn preorder(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes on the longest root-to-leaf path. A lone root is 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root(), 1usize)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(self.node(id).children.iter().map(|child| (*child, level + 1)));
        }
        deepest
    }

    /// Looks up a node by its absolute path.
    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.path == path)
            .map(NodeId)
    }

    /// Path of a node relative to the root. The root itself maps to `""`.
    pub fn relative_path(&self, id: NodeId) -> PathBuf {
        let node = self.node(id);
        node.path
            .strip_prefix(&self.root_node().path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| node.path.clone())
    }

    /// A serializable view of the subtree rooted at `id`.
    pub fn record(&self, id: NodeId) -> NodeRecord<'_> {
        NodeRecord { tree: self, id }
    }
}

impl Serialize for FileTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record(self.root()).serialize(serializer)
    }
}

/// Pre-order iterator over a [`FileTree`].
pub struct PreOrder<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

/// Serializes as `{name, path, is_directory, description, children}`.
pub struct NodeRecord<'a> {
    tree: &'a FileTree,
    id: NodeId,
}

impl Serialize for NodeRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.tree.node(self.id);
        let mut record = serializer.serialize_struct("Node", 5)?;
        record.serialize_field("name", &node.name)?;
        record.serialize_field("path", &*node.path.to_string_lossy())?;
        record.serialize_field("is_directory", &node.is_directory)?;
        record.serialize_field("description", &node.description)?;
        record.serialize_field(
            "children",
            &ChildRecords {
                tree: self.tree,
                children: &node.children,
            },
        )?;
        record.end()
    }
}

struct ChildRecords<'a> {
    tree: &'a FileTree,
    children: &'a [NodeId],
}

impl Serialize for ChildRecords<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.children.len()))?;
        for child in self.children {
            seq.serialize_element(&self.tree.record(*child))?;
        }
        seq.end()
    }
}
