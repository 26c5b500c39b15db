//! Compiled dataset model.
//!
//! A [`ModelNode`] tree is what the serving layer reads: each node has a
//! name, a [`NodeKind`], verbatim attributes, ordered children and an
//! optional [`DataSource`]. Nodes own their children exclusively; there are no
//! back-references.

use indexmap::IndexMap;

use crate::{binding::DataSource, registry::NodeKind, value::Mapping};

/// A node of a compiled dataset tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    name: String,
    kind: NodeKind,
    attributes: Mapping,
    children: IndexMap<String, ModelNode>,
    data: Option<DataSource>,
}

impl ModelNode {
    /// Create a node with no attributes, children or data.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Mapping::new(),
            children: IndexMap::new(),
            data: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Mapping) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_data(mut self, data: DataSource) -> Self {
        self.data = Some(data);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attributes(&self) -> &Mapping {
        &self.attributes
    }

    /// The data source bound to this node, if any.
    pub fn data(&self) -> Option<&DataSource> {
        self.data.as_ref()
    }

    /// Insert `child` under `key`.
    ///
    /// A child already stored under `key` is replaced in place, keeping its
    /// position; otherwise the child is appended.
    pub fn insert_child(&mut self, key: impl Into<String>, child: ModelNode) {
        self.children.insert(key.into(), child);
    }

    pub fn child(&self, key: &str) -> Option<&ModelNode> {
        self.children.get(key)
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &ModelNode> {
        self.children.values()
    }

    pub fn children_count(&self) -> usize {
        self.children.len()
    }

    /// Follow a dotted path of child keys from this node.
    ///
    /// An empty path returns this node.
    pub fn find(&self, path: &str) -> Option<&ModelNode> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.')
            .try_fold(self, |node, key| node.child(key))
    }

    /// Every node of the subtree in depth-first pre-order, paired with its
    /// dotted path from this node's name.
    pub fn walk(&self) -> Vec<(String, &ModelNode)> {
        let mut nodes = Vec::new();
        self.walk_into(self.name.clone(), &mut nodes);
        nodes
    }

    fn walk_into<'a>(&'a self, path: String, nodes: &mut Vec<(String, &'a ModelNode)>) {
        nodes.push((path.clone(), self));
        for (key, child) in &self.children {
            child.walk_into(format!("{path}.{key}"), nodes);
        }
    }
}
