//! Applies a flat column order to the grouped column hierarchy.
//!
//! The hierarchy is walked top-down. At every group the next column of the
//! requested order decides which child comes next; that child's subtree must
//! then consume a contiguous run of the order. An order that would tear a
//! group apart is rejected. The walk runs once without touching the tree and
//! a second time to relink child lists, so a rejected order leaves the tree
//! as it was.

use std::collections::{HashMap, HashSet, VecDeque};

use horizon_grid_core::logging::targets;

use super::tree::{ColumnTree, NodeId, NodeKind};
use super::ColumnId;
use crate::error::{GridError, Result};

/// New child order for one group, or for the top level when `parent` is `None`.
type Placement = (Option<NodeId>, Vec<NodeId>);

/// Reorders the column hierarchy to match a flat column order.
///
/// Callers validate that the order is a permutation of the tree's columns.
#[derive(Debug, Default)]
pub struct ColumnOrderReconciler {
    leaf_sets: HashMap<NodeId, HashSet<ColumnId>>,
}

impl ColumnOrderReconciler {
    /// Create a reconciler with an empty leaf-set cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `order` can be applied below `roots` without mutating.
    pub fn dry_run(&mut self, tree: &ColumnTree, roots: &[NodeId], order: &[ColumnId]) -> Result<()> {
        self.walk(tree, roots, order).map(|_| ())
    }

    /// Apply `order` below `roots`, relinking group children.
    ///
    /// Returns the new order of `roots`. On error the tree is untouched.
    pub fn apply(
        &mut self,
        tree: &mut ColumnTree,
        roots: &[NodeId],
        order: &[ColumnId],
    ) -> Result<Vec<NodeId>> {
        let placements = self.walk(tree, roots, order)?;
        let mut new_roots = Vec::new();
        for (parent, children) in placements {
            match parent {
                Some(group) => tree.set_children(group, children),
                None => new_roots = children,
            }
        }
        tracing::trace!(target: targets::REORDER, roots = new_roots.len(), "hierarchy relinked");
        Ok(new_roots)
    }

    fn walk(&mut self, tree: &ColumnTree, roots: &[NodeId], order: &[ColumnId]) -> Result<Vec<Placement>> {
        let mut queue: VecDeque<ColumnId> = order.iter().copied().collect();
        let mut placements = Vec::new();
        self.place_children(tree, None, roots, &mut queue, &mut placements)?;
        if !queue.is_empty() {
            return Err(GridError::internal(format!(
                "{} columns of the order are not in the hierarchy",
                queue.len()
            )));
        }
        Ok(placements)
    }

    fn place_children(
        &mut self,
        tree: &ColumnTree,
        parent: Option<NodeId>,
        children: &[NodeId],
        queue: &mut VecDeque<ColumnId>,
        placements: &mut Vec<Placement>,
    ) -> Result<()> {
        let mut remaining = children.to_vec();
        let mut placed = Vec::with_capacity(children.len());

        while !remaining.is_empty() {
            let head = queue
                .front()
                .copied()
                .ok_or_else(|| GridError::internal("column order exhausted before the hierarchy"))?;
            let Some(idx) = remaining
                .iter()
                .position(|&child| self.leaf_set(tree, child).contains(&head))
            else {
                let pending: Vec<String> = queue.iter().map(|&c| tree.label(c)).collect();
                tracing::debug!(target: targets::REORDER, head = %head, "order splits a column group");
                return Err(GridError::unsupported(
                    format!(
                        "The column order cannot be applied without splitting a column group. \
                         Unconsumed columns: [{}]",
                        pending.join(", ")
                    ),
                    String::new(),
                ));
            };

            let child = remaining.remove(idx);
            self.visit(tree, child, queue, placements)?;
            placed.push(child);
        }

        placements.push((parent, placed));
        Ok(())
    }

    fn visit(
        &mut self,
        tree: &ColumnTree,
        node: NodeId,
        queue: &mut VecDeque<ColumnId>,
        placements: &mut Vec<Placement>,
    ) -> Result<()> {
        match tree.node(node).map(|n| n.kind()) {
            Some(NodeKind::Leaf(column)) => match queue.pop_front() {
                Some(next) if next == *column => Ok(()),
                next => Err(GridError::internal(format!(
                    "expected column {column} next in the order, found {next:?}"
                ))),
            },
            Some(NodeKind::Group { children }) => {
                let children = children.clone();
                self.place_children(tree, Some(node), &children, queue, placements)
            }
            None => Err(GridError::internal("hierarchy refers to a removed node")),
        }
    }

    fn leaf_set(&mut self, tree: &ColumnTree, node: NodeId) -> &HashSet<ColumnId> {
        self.leaf_sets
            .entry(node)
            .or_insert_with(|| tree.leaf_set(node))
    }
}
