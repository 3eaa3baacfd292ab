//! Arena storage for the column hierarchy.
//!
//! Data columns are leaves and column groups are inner nodes. Nodes live in a
//! [`SlotMap`] and refer to each other through [`NodeId`]s; each node stores
//! its parent and, for groups, its ordered children. The tree itself has no
//! root: the nodes of the outermost layer are the top of the hierarchy.

use std::collections::{HashMap, HashSet};

use horizon_grid_core::DebugTree;
use slotmap::{new_key_type, Key, SlotMap};

use super::ColumnId;

new_key_type! {
    /// Handle of a leaf or group node in a [`ColumnTree`].
    ///
    /// Node ids stay valid until the node is removed from the tree.
    pub struct NodeId;
}

/// The two kinds of hierarchy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A data column.
    Leaf(ColumnId),
    /// A column group with at least one child.
    Group {
        /// Children, left to right.
        children: Vec<NodeId>,
    },
}

/// A node of the column hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    /// Parent group, `None` for nodes of the outermost layer.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Leaf or group.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node is a data column.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Children of a group; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Group { children } => children,
        }
    }
}

/// Arena of column hierarchy nodes.
#[derive(Debug, Default)]
pub struct ColumnTree {
    nodes: SlotMap<NodeId, Node>,
    leaves: HashMap<ColumnId, NodeId>,
    labels: HashMap<ColumnId, String>,
}

impl ColumnTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, leaves and groups together.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node; empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or(&[])
    }

    /// The leaf node of a column.
    pub fn leaf(&self, column: ColumnId) -> Option<NodeId> {
        self.leaves.get(&column).copied()
    }

    /// The column of a leaf node.
    pub fn column_of(&self, id: NodeId) -> Option<ColumnId> {
        match self.nodes.get(id)?.kind {
            NodeKind::Leaf(column) => Some(column),
            NodeKind::Group { .. } => None,
        }
    }

    /// Set the display label used for a column in hierarchy dumps.
    pub fn set_label(&mut self, column: ColumnId, label: impl Into<String>) {
        self.labels.insert(column, label.into());
    }

    /// Label of a column: its key if one was set, otherwise its client id.
    pub fn label(&self, column: ColumnId) -> String {
        self.labels
            .get(&column)
            .cloned()
            .unwrap_or_else(|| column.to_string())
    }

    // =========================================================================
    // Construction and removal
    // =========================================================================

    /// Insert a detached leaf for `column`.
    pub fn insert_leaf(&mut self, column: ColumnId) -> NodeId {
        let id = self.nodes.insert(Node {
            parent: None,
            kind: NodeKind::Leaf(column),
        });
        self.leaves.insert(column, id);
        id
    }

    /// Insert a group owning `children`. The group itself is detached.
    ///
    /// The children's parent links are repointed to the new group; the caller
    /// is responsible for removing them from their previous parent.
    pub fn insert_group(&mut self, children: Vec<NodeId>) -> NodeId {
        let id = self.nodes.insert(Node {
            parent: None,
            kind: NodeKind::Group {
                children: children.clone(),
            },
        });
        for child in children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(id);
            }
        }
        id
    }

    /// Remove one node from the arena.
    ///
    /// Neither the parent's child list nor the children's parent links are
    /// touched.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        if let NodeKind::Leaf(column) = node.kind {
            self.leaves.remove(&column);
            self.labels.remove(&column);
        }
        Some(node)
    }

    /// Set a node's parent link.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Replace the child list of a group and repoint the children's parents.
    pub fn set_children(&mut self, group: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.set_parent(child, Some(group));
        }
        if let Some(Node {
            kind: NodeKind::Group { children: current },
            ..
        }) = self.nodes.get_mut(group)
        {
            *current = children;
        }
    }

    /// Append a child to a group.
    pub fn push_child(&mut self, group: NodeId, child: NodeId) {
        if let Some(Node {
            kind: NodeKind::Group { children },
            ..
        }) = self.nodes.get_mut(group)
        {
            children.push(child);
            self.set_parent(child, Some(group));
        }
    }

    /// Remove a child from its group's child list.
    ///
    /// Returns the number of children the group has left.
    pub fn detach_child(&mut self, group: NodeId, child: NodeId) -> usize {
        let remaining = match self.nodes.get_mut(group) {
            Some(Node {
                kind: NodeKind::Group { children },
                ..
            }) => {
                children.retain(|&c| c != child);
                children.len()
            }
            _ => 0,
        };
        self.set_parent(child, None);
        remaining
    }

    /// Replace the `old` range of a group's children with `new`.
    fn replace_in_parent(&mut self, parent: NodeId, old: &[NodeId], new: &[NodeId]) {
        if let Some(Node {
            kind: NodeKind::Group { children },
            ..
        }) = self.nodes.get_mut(parent)
        {
            let Some(start) = children.iter().position(|c| old.contains(c)) else {
                return;
            };
            children.retain(|c| !old.contains(c));
            for (offset, &id) in new.iter().enumerate() {
                children.insert(start + offset, id);
            }
        }
        for &id in new {
            self.set_parent(id, Some(parent));
        }
    }

    /// Wrap `id` in a new single-child group that takes its place under the
    /// old parent.
    pub fn wrap(&mut self, id: NodeId) -> NodeId {
        self.wrap_range(&[id])
    }

    /// Wrap sibling nodes in one new group that takes their place under their
    /// common parent.
    ///
    /// The nodes must share a parent (or all be top-level) and be adjacent in
    /// the parent's child list.
    pub fn wrap_range(&mut self, ids: &[NodeId]) -> NodeId {
        let parent = ids.first().and_then(|&id| self.parent(id));
        let group = self.insert_group(ids.to_vec());
        if let Some(parent) = parent {
            self.replace_in_parent(parent, ids, &[group]);
        }
        group
    }

    /// Dissolve a group: its children take its place under its parent and
    /// the group is removed.
    ///
    /// Returns the dissolved group's children.
    pub fn splice_out(&mut self, group: NodeId) -> Vec<NodeId> {
        let parent = self.parent(group);
        let children = self.children(group).to_vec();
        match parent {
            Some(parent) => self.replace_in_parent(parent, &[group], &children),
            None => {
                for &child in &children {
                    self.set_parent(child, None);
                }
            }
        }
        self.remove_node(group);
        children
    }

    /// Merge adjacent sibling groups into one new group holding all of their
    /// children, in order. The merged groups are removed.
    pub fn merge_groups(&mut self, groups: &[NodeId]) -> NodeId {
        let parent = groups.first().and_then(|&id| self.parent(id));
        let children: Vec<NodeId> = groups
            .iter()
            .flat_map(|&g| self.children(g).to_vec())
            .collect();
        let merged = self.insert_group(children);
        if let Some(parent) = parent {
            self.replace_in_parent(parent, groups, &[merged]);
        }
        for &group in groups {
            self.remove_node(group);
        }
        merged
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Ancestor `levels` steps up; `levels == 0` is the node itself.
    pub fn ancestor(&self, id: NodeId, levels: usize) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..levels {
            current = self.parent(current)?;
        }
        Some(current)
    }

    /// Bottom-level columns of a node, left to right.
    pub fn leaf_columns(&self, id: NodeId) -> Vec<ColumnId> {
        let mut out = Vec::new();
        self.collect_leaf_columns(id, &mut out);
        out
    }

    fn collect_leaf_columns(&self, id: NodeId, out: &mut Vec<ColumnId>) {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(column)) => out.push(*column),
            Some(NodeKind::Group { children }) => {
                for &child in children {
                    self.collect_leaf_columns(child, out);
                }
            }
            None => {}
        }
    }

    /// Bottom-level columns of a node as a set.
    pub fn leaf_set(&self, id: NodeId) -> HashSet<ColumnId> {
        self.leaf_columns(id).into_iter().collect()
    }

    /// Bottom-level columns of several nodes, left to right.
    pub fn leaf_columns_of(&self, ids: &[NodeId]) -> Vec<ColumnId> {
        ids.iter().flat_map(|&id| self.leaf_columns(id)).collect()
    }

    /// Human-readable label of a node.
    pub fn node_label(&self, id: NodeId) -> String {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(column)) => self.label(*column),
            Some(NodeKind::Group { .. }) => "group".to_string(),
            None => "(removed)".to_string(),
        }
    }
}

/// [`DebugTree`] view of a [`ColumnTree`] from a given set of top-level nodes.
pub struct ColumnTreeDebug<'a> {
    tree: &'a ColumnTree,
    roots: &'a [NodeId],
}

impl<'a> ColumnTreeDebug<'a> {
    /// View the hierarchy below `roots`.
    pub fn new(tree: &'a ColumnTree, roots: &'a [NodeId]) -> Self {
        Self { tree, roots }
    }
}

impl DebugTree for ColumnTreeDebug<'_> {
    type Node = NodeId;

    fn roots(&self) -> Vec<NodeId> {
        self.roots.to_vec()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.children(node).to_vec()
    }

    fn label(&self, node: NodeId) -> String {
        self.tree.node_label(node)
    }

    fn id_label(&self, node: NodeId) -> String {
        match self.tree.column_of(node) {
            Some(column) => column.to_string(),
            None => format!("g{}", node.data().as_ffi() & 0xffff_ffff),
        }
    }
}

#[cfg(test)]
mod tests {
    use horizon_grid_core::{TreeFormatOptions, TreeFormatter};

    use super::*;
    use crate::column::Column;

    fn leaves(tree: &mut ColumnTree, n: usize) -> (Vec<ColumnId>, Vec<NodeId>) {
        let columns: Vec<ColumnId> = (0..n).map(|_| Column::<()>::new().id()).collect();
        let nodes = columns.iter().map(|&c| tree.insert_leaf(c)).collect();
        (columns, nodes)
    }

    #[test]
    fn test_group_sets_parent_links() {
        let mut tree = ColumnTree::new();
        let (columns, nodes) = leaves(&mut tree, 2);
        let group = tree.insert_group(nodes.clone());

        assert_eq!(tree.parent(nodes[0]), Some(group));
        assert_eq!(tree.children(group), nodes.as_slice());
        assert_eq!(tree.leaf_columns(group), columns);
        assert_eq!(tree.column_of(nodes[1]), Some(columns[1]));
        assert_eq!(tree.column_of(group), None);
    }

    #[test]
    fn test_wrap_keeps_position_in_parent() {
        let mut tree = ColumnTree::new();
        let (_, nodes) = leaves(&mut tree, 3);
        let group = tree.insert_group(nodes.clone());

        let wrapper = tree.wrap(nodes[1]);
        assert_eq!(tree.children(group), &[nodes[0], wrapper, nodes[2]]);
        assert_eq!(tree.parent(wrapper), Some(group));
        assert_eq!(tree.parent(nodes[1]), Some(wrapper));
        assert_eq!(tree.ancestor(nodes[1], 2), Some(group));
    }

    #[test]
    fn test_splice_out_restores_children() {
        let mut tree = ColumnTree::new();
        let (_, nodes) = leaves(&mut tree, 3);
        let outer = tree.insert_group(nodes.clone());
        let wrapper = tree.wrap_range(&nodes[0..2]);
        assert_eq!(tree.children(outer), &[wrapper, nodes[2]]);

        let children = tree.splice_out(wrapper);
        assert_eq!(children, &nodes[0..2]);
        assert_eq!(tree.children(outer), nodes.as_slice());
        assert!(!tree.contains(wrapper));
    }

    #[test]
    fn test_merge_groups() {
        let mut tree = ColumnTree::new();
        let (columns, nodes) = leaves(&mut tree, 3);
        let g0 = tree.insert_group(vec![nodes[0]]);
        let g1 = tree.insert_group(vec![nodes[1]]);
        let g2 = tree.insert_group(vec![nodes[2]]);
        let top = tree.insert_group(vec![g0, g1, g2]);

        let merged = tree.merge_groups(&[g0, g1]);
        assert_eq!(tree.children(top), &[merged, g2]);
        assert_eq!(tree.leaf_columns(merged), &columns[0..2]);
        assert!(!tree.contains(g0));
        assert_eq!(tree.parent(nodes[1]), Some(merged));
    }

    #[test]
    fn test_remove_leaf_forgets_column() {
        let mut tree = ColumnTree::new();
        let (columns, nodes) = leaves(&mut tree, 1);
        tree.set_label(columns[0], "name");
        assert_eq!(tree.label(columns[0]), "name");

        tree.remove_node(nodes[0]);
        assert_eq!(tree.leaf(columns[0]), None);
        assert_eq!(tree.label(columns[0]), columns[0].to_string());
    }

    #[test]
    fn test_debug_tree_dump() {
        let mut tree = ColumnTree::new();
        let (columns, nodes) = leaves(&mut tree, 2);
        tree.set_label(columns[0], "a");
        tree.set_label(columns[1], "b");
        let group = tree.insert_group(nodes);
        let roots = [group];

        let dump = TreeFormatter::with_options(TreeFormatOptions::minimal())
            .format(&ColumnTreeDebug::new(&tree, &roots));
        assert_eq!(dump, "group\n+-- a\n`-- b\n");
    }
}
