//! The layer stack: header/footer row insertion and removal, cell joins and
//! column membership.
//!
//! Layer 0 holds the leaf of every column and is never removed. Every outer
//! layer holds the groups one level up, and every node of layer `m` is a
//! child of exactly one node of layer `m + 1`, so each layer covers all
//! columns. Layers above 0 exist only while a row is bound to them.
//!
//! Header rows read top-down from the outermost header layer to layer 0;
//! footer rows read top-down from layer 0 to the outermost footer layer.

use std::collections::{HashMap, HashSet};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{PerfSpan, TreeFormatOptions, TreeFormatter};

use super::layer::{Cell, CellId, ColumnLayer, Row, RowId, RowKind};
use super::reorder::ColumnOrderReconciler;
use super::tree::{ColumnTree, ColumnTreeDebug, NodeId};
use super::ColumnId;
use crate::error::{GridError, Result};

/// The ordered sequence of column layers with their rows.
#[derive(Debug)]
pub struct ColumnLayerStack {
    tree: ColumnTree,
    layers: Vec<ColumnLayer>,
    default_header: Option<RowId>,
}

impl Default for ColumnLayerStack {
    fn default() -> Self {
        Self::new()
    }
}

/// How a join is carried out once the scan found it possible.
enum JoinPlan {
    /// Merge the joined groups on the row's own layer.
    InPlace,
    /// Move the row to a new layer inserted at this index.
    Relocate(usize),
}

impl ColumnLayerStack {
    /// Create a stack with an empty layer 0 and no rows.
    pub fn new() -> Self {
        Self {
            tree: ColumnTree::new(),
            layers: vec![ColumnLayer::new(Vec::new())],
            default_header: None,
        }
    }

    /// The node arena.
    pub fn tree(&self) -> &ColumnTree {
        &self.tree
    }

    /// All layers, innermost first.
    pub fn layers(&self) -> &[ColumnLayer] {
        &self.layers
    }

    /// Number of layers (at least 1).
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn top(&self) -> usize {
        self.layers.len() - 1
    }

    /// Columns in display order.
    pub fn columns(&self) -> Vec<ColumnId> {
        self.layers[0]
            .nodes()
            .iter()
            .filter_map(|&n| self.tree.column_of(n))
            .collect()
    }

    /// Whether the column belongs to this stack.
    pub fn contains_column(&self, column: ColumnId) -> bool {
        self.tree.leaf(column).is_some()
    }

    /// Set the label used for a column in diagnostics.
    pub fn set_column_label(&mut self, column: ColumnId, label: impl Into<String>) {
        self.tree.set_label(column, label);
    }

    /// Render the column hierarchy from the outermost layer down.
    pub fn format_hierarchy(&self, options: TreeFormatOptions) -> String {
        let roots = self.layers[self.top()].nodes();
        TreeFormatter::with_options(options).format(&ColumnTreeDebug::new(&self.tree, roots))
    }

    fn hierarchy_dump(&self) -> String {
        self.format_hierarchy(TreeFormatOptions::default())
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Append a column.
    ///
    /// The new leaf is wrapped in a single-child group on every outer layer,
    /// and every row gets an empty cell at the end.
    pub fn add_column(&mut self, column: ColumnId) -> Result<NodeId> {
        if self.contains_column(column) {
            return Err(GridError::DuplicateColumn(column));
        }

        let leaf = self.tree.insert_leaf(column);
        let mut current = leaf;
        for m in 0..self.layers.len() {
            if m > 0 {
                current = self.tree.insert_group(vec![current]);
            }
            let layer = &mut self.layers[m];
            layer.nodes_mut().push(current);
            for row in layer.rows_mut() {
                row.cells_mut().push(Cell::new());
            }
        }
        tracing::debug!(target: targets::COLUMNS, %column, layers = self.layers.len(), "column added");
        Ok(leaf)
    }

    /// Remove a column, its cells, and every group left without children.
    pub fn remove_column(&mut self, column: ColumnId) -> Result<()> {
        let leaf = self
            .tree
            .leaf(column)
            .ok_or(GridError::ColumnNotFound(column))?;

        let mut node = leaf;
        let mut removed_groups = 0;
        for m in 0..self.layers.len() {
            let layer = &mut self.layers[m];
            let pos = layer
                .position_of(node)
                .ok_or_else(|| GridError::internal(format!("node of {column} missing from layer {m}")))?;
            layer.nodes_mut().remove(pos);
            for row in layer.rows_mut() {
                row.cells_mut().remove(pos);
            }

            let parent = self.tree.parent(node);
            let remaining = parent.map(|p| self.tree.detach_child(p, node));
            self.tree.remove_node(node);
            match (parent, remaining) {
                (Some(parent), Some(0)) => {
                    node = parent;
                    removed_groups += 1;
                }
                _ => break,
            }
        }
        tracing::debug!(target: targets::COLUMNS, %column, removed_groups, "column removed");
        Ok(())
    }

    /// Wrap every node of layer `m` in a new single-child group and insert
    /// the groups as a new, row-less layer at `m + 1`.
    fn insert_layer_above(&mut self, m: usize) {
        let nodes = self.layers[m].nodes().to_vec();
        let wrappers = nodes.into_iter().map(|n| self.tree.wrap(n)).collect();
        self.layers.insert(m + 1, ColumnLayer::new(wrappers));
        tracing::trace!(target: targets::ROWS, layer = m + 1, "layer inserted");
    }

    /// Remove layer `m >= 1`; each of its groups is replaced by its children.
    fn remove_layer(&mut self, m: usize) {
        debug_assert!(m >= 1, "layer 0 is never removed");
        let layer = self.layers.remove(m);
        for &group in layer.nodes() {
            self.tree.splice_out(group);
        }
        tracing::trace!(target: targets::ROWS, layer = m, "layer removed");
    }

    // =========================================================================
    // Row lookup
    // =========================================================================

    /// Layer index and kind of a row.
    pub fn locate_row(&self, id: RowId) -> Option<(usize, RowKind)> {
        self.layers.iter().enumerate().find_map(|(m, layer)| {
            layer
                .rows()
                .find(|row| row.id() == id)
                .map(|row| (m, row.kind()))
        })
    }

    /// Look up a row.
    pub fn row(&self, id: RowId) -> Option<&Row> {
        let (m, kind) = self.locate_row(id)?;
        self.layers[m].row(kind)
    }

    /// Look up a row for mutation of its cell contents.
    pub fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        let (m, kind) = self.locate_row(id)?;
        self.layers[m].row_mut(kind)
    }

    /// Header rows, top to bottom.
    pub fn header_rows(&self) -> Vec<&Row> {
        self.layers.iter().rev().filter_map(ColumnLayer::header).collect()
    }

    /// Footer rows, top to bottom.
    pub fn footer_rows(&self) -> Vec<&Row> {
        self.layers.iter().filter_map(ColumnLayer::footer).collect()
    }

    fn row_count(&self, kind: RowKind) -> usize {
        self.layers.iter().filter(|l| l.row(kind).is_some()).count()
    }

    /// Index of the outermost layer carrying a row of `kind`.
    pub fn outermost_row_layer(&self, kind: RowKind) -> Option<usize> {
        self.layers.iter().rposition(|l| l.row(kind).is_some())
    }

    /// The default header row, which shows the sort indicators.
    pub fn default_header_row(&self) -> Option<&Row> {
        self.default_header.and_then(|id| self.row(id))
    }

    /// Id of the default header row.
    pub fn default_header_row_id(&self) -> Option<RowId> {
        self.default_header
    }

    // =========================================================================
    // Row insertion and removal
    // =========================================================================

    /// Add a header row below all existing header rows.
    pub fn append_header_row(&mut self) -> RowId {
        self.add_inner_row(RowKind::Header)
    }

    /// Add a header row above all existing header rows.
    pub fn prepend_header_row(&mut self) -> RowId {
        self.add_outer_row(RowKind::Header)
    }

    /// Add a footer row above all existing footer rows.
    pub fn prepend_footer_row(&mut self) -> RowId {
        self.add_inner_row(RowKind::Footer)
    }

    /// Add a footer row below all existing footer rows.
    pub fn append_footer_row(&mut self) -> RowId {
        self.add_outer_row(RowKind::Footer)
    }

    /// Bind a new row of `kind` to layer 0, pushing layer 0's existing row
    /// of that kind out onto a new wrapping layer.
    fn add_inner_row(&mut self, kind: RowKind) -> RowId {
        if self.layers[0].row(kind).is_some() {
            self.insert_layer_above(0);
            if let Some(row) = self.layers[0].take_row(kind) {
                self.layers[1].bind_row(row);
            }
        }
        self.bind_new_row(0, kind)
    }

    /// Bind a new row of `kind` to a new layer just outside the outermost
    /// row of that kind.
    fn add_outer_row(&mut self, kind: RowKind) -> RowId {
        match self.outermost_row_layer(kind) {
            None => self.bind_new_row(0, kind),
            Some(m) => {
                self.insert_layer_above(m);
                self.bind_new_row(m + 1, kind)
            }
        }
    }

    fn bind_new_row(&mut self, m: usize, kind: RowKind) -> RowId {
        let row = Row::new(kind, self.layers[m].nodes().len());
        let id = row.id();
        self.layers[m].bind_row(row);
        if kind == RowKind::Header && self.default_header.is_none() {
            self.default_header = Some(id);
        }
        tracing::debug!(target: targets::ROWS, row = id.as_u64(), ?kind, layer = m, "row added");
        id
    }

    /// Remove a header or footer row.
    ///
    /// Removing the row on layer 0 while other rows of its kind exist pulls
    /// the nearest outer row of that kind down to layer 0; this requires that
    /// row's layer to have one node per column.
    pub fn remove_row(&mut self, id: RowId) -> Result<()> {
        let (m, kind) = self.locate_row(id).ok_or(GridError::RowNotFound(id))?;
        let has_siblings = self.row_count(kind) > 1;
        let is_default = self.default_header == Some(id);

        if is_default && has_siblings {
            return Err(GridError::DefaultHeaderRowInUse);
        }

        if m == 0 && has_siblings {
            let q = (1..self.layers.len())
                .find(|&q| self.layers[q].row(kind).is_some())
                .ok_or_else(|| GridError::internal("sibling row vanished"))?;
            let expected = self.layers[0].nodes().len();
            if self.layers[q].nodes().len() != expected {
                let (row, actual) = self.layers[q]
                    .row(kind)
                    .map(|r| (r.id(), r.cells().len()))
                    .ok_or_else(|| GridError::internal("sibling row vanished"))?;
                return Err(GridError::RowArityMismatch {
                    row,
                    expected,
                    actual,
                });
            }

            self.layers[0].take_row(kind);
            let moved = self.layers[q]
                .take_row(kind)
                .ok_or_else(|| GridError::internal("sibling row vanished"))?;
            self.layers[0].bind_row(moved);
            if !self.layers[q].has_rows() {
                self.remove_layer(q);
            }
        } else {
            self.layers[m].take_row(kind);
            if m > 0 && !self.layers[m].has_rows() {
                self.remove_layer(m);
            }
        }

        if is_default {
            self.default_header = None;
        }
        tracing::debug!(target: targets::ROWS, row = id.as_u64(), ?kind, layer = m, "row removed");
        Ok(())
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// The cell of `row` that covers `column`.
    pub fn cell(&self, row: RowId, column: ColumnId) -> Result<&Cell> {
        let (m, kind, pos) = self.cell_position(row, column)?;
        self.layers[m]
            .row(kind)
            .and_then(|r| r.cells().get(pos))
            .ok_or_else(|| GridError::internal(format!("row {row:?} has no cell at {pos}")))
    }

    /// Mutable access to the cell of `row` that covers `column`.
    pub fn cell_mut(&mut self, row: RowId, column: ColumnId) -> Result<&mut Cell> {
        let (m, kind, pos) = self.cell_position(row, column)?;
        self.layers[m]
            .row_mut(kind)
            .and_then(|r| r.cells_mut().get_mut(pos))
            .ok_or_else(|| GridError::internal(format!("row {row:?} has no cell at {pos}")))
    }

    fn cell_position(&self, row: RowId, column: ColumnId) -> Result<(usize, RowKind, usize)> {
        let (m, kind) = self.locate_row(row).ok_or(GridError::RowNotFound(row))?;
        let leaf = self
            .tree
            .leaf(column)
            .ok_or(GridError::ColumnNotFound(column))?;
        let pos = self
            .tree
            .ancestor(leaf, m)
            .and_then(|node| self.layers[m].position_of(node))
            .ok_or_else(|| GridError::internal(format!("{column} has no node on layer {m}")))?;
        Ok((m, kind, pos))
    }

    /// Columns covered by a cell, left to right.
    pub fn cell_columns(&self, row: RowId, cell: CellId) -> Result<Vec<ColumnId>> {
        let (m, kind) = self.locate_row(row).ok_or(GridError::RowNotFound(row))?;
        let layer = &self.layers[m];
        let pos = layer
            .row(kind)
            .and_then(|r| r.position_of(cell))
            .ok_or(GridError::CellNotFound { row, cell })?;
        Ok(self.tree.leaf_columns(layer.nodes()[pos]))
    }

    // =========================================================================
    // Join
    // =========================================================================

    /// Join adjacent cells of the outermost row of their kind into one cell
    /// spanning all of their columns.
    ///
    /// The merged cell takes the content of the leftmost joined cell. Nothing
    /// is mutated when the join fails.
    pub fn join(&mut self, row: RowId, cells: &[CellId]) -> Result<CellId> {
        let _span = PerfSpan::new("join");
        let (k, kind) = self.locate_row(row).ok_or(GridError::RowNotFound(row))?;
        if self.outermost_row_layer(kind) != Some(k) {
            return Err(GridError::JoinNotOutermost(row));
        }
        if cells.len() < 2 {
            return Err(GridError::JoinTooFewCells(cells.len()));
        }

        let bound = self.layers[k]
            .row(kind)
            .ok_or_else(|| GridError::internal("located row is not bound"))?;
        let mut positions = cells
            .iter()
            .map(|&cell| bound.position_of(cell).ok_or(GridError::CellNotFound { row, cell }))
            .collect::<Result<Vec<_>>>()?;
        positions.sort_unstable();
        if positions.windows(2).any(|w| w[0] == w[1]) {
            return Err(GridError::invalid("the same cell was passed to join more than once"));
        }
        if positions.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err(GridError::JoinNotAdjacent);
        }
        let (i, j) = (positions[0], positions[positions.len() - 1]);

        let joined: Vec<NodeId> = self.layers[k].nodes()[i..=j].to_vec();
        let union: HashSet<ColumnId> = self.tree.leaf_columns_of(&joined).into_iter().collect();
        let plan = self.plan_join(k, kind, &union, self.layers[k].nodes().len() - joined.len())?;

        let (merged, how) = match plan {
            JoinPlan::InPlace => (self.join_in_place(k, kind, i, j, &joined)?, "in-place"),
            JoinPlan::Relocate(p) => (self.join_relocating(k, kind, i, j, p, &union)?, "relocate"),
        };
        tracing::debug!(target: targets::ROWS, row = row.as_u64(), cells = cells.len(), how, "cells joined");
        Ok(merged)
    }

    /// Scan outward from layer `k` to find where the joined columns `union`
    /// can be grouped. `disjoint_k` is the number of layer-`k` nodes outside
    /// the join.
    fn plan_join(
        &self,
        k: usize,
        kind: RowKind,
        union: &HashSet<ColumnId>,
        disjoint_k: usize,
    ) -> Result<JoinPlan> {
        let top = self.top();
        let shares_layer = self.layers[k].row(kind.other()).is_some();
        let can_merge_in_place = k >= 1 && !shares_layer;

        for m in (k + 1)..=top {
            let mut contained = false;
            let mut disjoint = 0;
            for &node in self.layers[m].nodes() {
                let leaves = self.tree.leaf_columns(node);
                let overlap = leaves.iter().filter(|c| union.contains(c)).count();
                if overlap == 0 {
                    disjoint += 1;
                } else if overlap == union.len() {
                    contained = true;
                } else if overlap != leaves.len() {
                    return Err(GridError::unsupported(
                        "The hierarchical structure of the columns does not allow this join: \
                         a column group partially overlaps the joined columns",
                        self.hierarchy_dump(),
                    ));
                }
            }

            if contained {
                return Ok(if m == k + 1 && can_merge_in_place {
                    JoinPlan::InPlace
                } else {
                    JoinPlan::Relocate(m)
                });
            }
            if disjoint != disjoint_k {
                return Err(GridError::unsupported(
                    "The hierarchical structure of the columns does not allow this join: \
                     columns next to the joined cells are grouped on an outer row",
                    self.hierarchy_dump(),
                ));
            }
        }

        Ok(if k == top && can_merge_in_place {
            JoinPlan::InPlace
        } else {
            JoinPlan::Relocate(top + 1)
        })
    }

    fn merged_cells(row: &mut Row, i: usize, j: usize) -> CellId {
        let content = row.cells_mut()[i].take_content();
        let merged = Cell::with_content(content);
        let id = merged.id();
        row.cells_mut().splice(i..=j, [merged]);
        id
    }

    fn join_in_place(
        &mut self,
        k: usize,
        kind: RowKind,
        i: usize,
        j: usize,
        joined: &[NodeId],
    ) -> Result<CellId> {
        let group = self.tree.merge_groups(joined);
        let layer = &mut self.layers[k];
        layer.nodes_mut().splice(i..=j, [group]);
        let row = layer
            .row_mut(kind)
            .ok_or_else(|| GridError::internal("joined row is not bound"))?;
        Ok(Self::merged_cells(row, i, j))
    }

    fn join_relocating(
        &mut self,
        k: usize,
        kind: RowKind,
        i: usize,
        j: usize,
        p: usize,
        union: &HashSet<ColumnId>,
    ) -> Result<CellId> {
        let below = self.layers[p - 1].nodes().to_vec();
        let overlaps = |n: NodeId| self.tree.leaf_columns(n).iter().any(|c| union.contains(c));
        let (Some(a), Some(b)) = (
            below.iter().position(|&n| overlaps(n)),
            below.iter().rposition(|&n| overlaps(n)),
        ) else {
            return Err(GridError::internal("joined columns missing from layer"));
        };

        let mut nodes = Vec::with_capacity(below.len() - (b - a));
        for (idx, &node) in below.iter().enumerate() {
            if idx == a {
                nodes.push(self.tree.wrap_range(&below[a..=b]));
            } else if idx < a || idx > b {
                nodes.push(self.tree.wrap(node));
            }
        }
        self.layers.insert(p, ColumnLayer::new(nodes));

        let mut row = self.layers[k]
            .take_row(kind)
            .ok_or_else(|| GridError::internal("joined row is not bound"))?;
        let merged = Self::merged_cells(&mut row, i, j);
        self.layers[p].bind_row(row);

        if k >= 1 && !self.layers[k].has_rows() {
            self.remove_layer(k);
        }
        Ok(merged)
    }

    // =========================================================================
    // Column order
    // =========================================================================

    /// Rearrange the hierarchy so the columns read in `order`.
    ///
    /// `order` must list every column exactly once. Fails without mutating
    /// anything when the grouping cannot be kept intact.
    pub fn set_column_order(&mut self, order: &[ColumnId]) -> Result<()> {
        let _span = PerfSpan::new("set_column_order");
        let mut seen = HashSet::with_capacity(order.len());
        for &column in order {
            if !self.contains_column(column) {
                return Err(GridError::ColumnNotFound(column));
            }
            if !seen.insert(column) {
                return Err(GridError::DuplicateColumn(column));
            }
        }
        let missing: Vec<String> = self
            .columns()
            .into_iter()
            .filter(|c| !seen.contains(c))
            .map(|c| self.tree.label(c))
            .collect();
        if !missing.is_empty() {
            return Err(GridError::MissingColumns { missing });
        }

        let top = self.top();
        let roots = self.layers[top].nodes().to_vec();
        let mut reconciler = ColumnOrderReconciler::new();
        reconciler
            .dry_run(&self.tree, &roots, order)
            .map_err(|e| self.with_hierarchy(e))?;
        let new_roots = reconciler.apply(&mut self.tree, &roots, order)?;

        self.reorder_layer(top, new_roots);
        for m in (1..=top).rev() {
            let lower: Vec<NodeId> = self.layers[m]
                .nodes()
                .iter()
                .flat_map(|&n| self.tree.children(n).to_vec())
                .collect();
            self.reorder_layer(m - 1, lower);
        }
        tracing::debug!(target: targets::REORDER, columns = order.len(), "column order applied");
        Ok(())
    }

    fn with_hierarchy(&self, error: GridError) -> GridError {
        match error {
            GridError::UnsupportedHierarchy { message, .. } => {
                GridError::unsupported(message, self.hierarchy_dump())
            }
            other => other,
        }
    }

    /// Put layer `m`'s nodes in `nodes` order, permuting its rows' cells along.
    fn reorder_layer(&mut self, m: usize, nodes: Vec<NodeId>) {
        let layer = &mut self.layers[m];
        let old = layer.nodes().to_vec();
        for row in layer.rows_mut() {
            let mut by_node: HashMap<NodeId, Cell> =
                old.iter().copied().zip(row.cells_mut().drain(..)).collect();
            let cells = nodes.iter().filter_map(|n| by_node.remove(n)).collect();
            row.set_cells(cells);
        }
        *layer.nodes_mut() = nodes;
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Check the structural invariants of the stack.
    ///
    /// Returns an internal error describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(GridError::internal(msg));

        let mut node_total = 0;
        for (m, layer) in self.layers.iter().enumerate() {
            node_total += layer.nodes().len();
            for row in layer.rows() {
                if row.cells().len() != layer.nodes().len() {
                    return fail(format!(
                        "row {:?} on layer {m} has {} cells for {} nodes",
                        row.id(),
                        row.cells().len(),
                        layer.nodes().len()
                    ));
                }
            }
            if m > 0 && !layer.has_rows() {
                return fail(format!("layer {m} carries no row"));
            }

            for &node in layer.nodes() {
                let Some(data) = self.tree.node(node) else {
                    return fail(format!("layer {m} refers to a removed node"));
                };
                if (m == 0) != data.is_leaf() {
                    return fail(format!("layer {m} holds a node of the wrong kind"));
                }
                if m > 0 && data.children().is_empty() {
                    return fail(format!("empty group on layer {m}"));
                }
                if m == self.top() && data.parent().is_some() {
                    return fail(format!("top-level node on layer {m} has a parent"));
                }
                for &child in data.children() {
                    if self.tree.parent(child) != Some(node) {
                        return fail(format!("broken parent link below layer {m}"));
                    }
                }
            }

            if m > 0 {
                let children: Vec<NodeId> = layer
                    .nodes()
                    .iter()
                    .flat_map(|&n| self.tree.children(n).to_vec())
                    .collect();
                if children != self.layers[m - 1].nodes() {
                    return fail(format!("layer {} does not match the children of layer {m}", m - 1));
                }
            }
        }

        if node_total != self.tree.len() {
            return fail(format!(
                "{} nodes are not part of any layer",
                self.tree.len().saturating_sub(node_total)
            ));
        }
        if let Some(id) = self.default_header {
            match self.locate_row(id) {
                Some((_, RowKind::Header)) => {}
                _ => return fail("default header row is not a bound header row".to_string()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn stack_with(n: usize) -> (ColumnLayerStack, Vec<ColumnId>) {
        let mut stack = ColumnLayerStack::new();
        let columns: Vec<ColumnId> = (0..n).map(|_| Column::<()>::new().id()).collect();
        for &c in &columns {
            stack.add_column(c).unwrap();
        }
        (stack, columns)
    }

    fn cell_ids(stack: &ColumnLayerStack, row: RowId) -> Vec<CellId> {
        stack.row(row).unwrap().cells().iter().map(Cell::id).collect()
    }

    #[test]
    fn test_first_row_binds_layer_zero() {
        let (mut stack, _) = stack_with(3);
        let header = stack.append_header_row();
        let footer = stack.append_footer_row();

        assert_eq!(stack.layer_count(), 1);
        assert_eq!(stack.locate_row(header), Some((0, RowKind::Header)));
        assert_eq!(stack.locate_row(footer), Some((0, RowKind::Footer)));
        assert_eq!(stack.default_header_row_id(), Some(header));
        stack.validate().unwrap();
    }

    #[test]
    fn test_append_header_pushes_existing_outward() {
        let (mut stack, _) = stack_with(2);
        let first = stack.append_header_row();
        let footer = stack.append_footer_row();
        let second = stack.append_header_row();

        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.locate_row(first), Some((1, RowKind::Header)));
        assert_eq!(stack.locate_row(second), Some((0, RowKind::Header)));
        assert_eq!(stack.locate_row(footer), Some((0, RowKind::Footer)));
        let order: Vec<RowId> = stack.header_rows().iter().map(|r| r.id()).collect();
        assert_eq!(order, vec![first, second]);
        assert_eq!(stack.default_header_row_id(), Some(first));
        stack.validate().unwrap();
    }

    #[test]
    fn test_footer_order() {
        let (mut stack, _) = stack_with(2);
        let a = stack.append_footer_row();
        let b = stack.append_footer_row();
        let c = stack.prepend_footer_row();

        let order: Vec<RowId> = stack.footer_rows().iter().map(|r| r.id()).collect();
        assert_eq!(order, vec![c, a, b]);
        stack.validate().unwrap();
    }

    #[test]
    fn test_add_column_extends_every_row() {
        let (mut stack, _) = stack_with(2);
        let inner = stack.append_header_row();
        let outer = stack.prepend_header_row();
        let added = Column::<()>::new().id();
        stack.add_column(added).unwrap();

        assert_eq!(stack.row(inner).unwrap().cells().len(), 3);
        assert_eq!(stack.row(outer).unwrap().cells().len(), 3);
        assert!(matches!(stack.add_column(added), Err(GridError::DuplicateColumn(_))));
        stack.validate().unwrap();
    }

    #[test]
    fn test_remove_column_cascades_empty_groups() {
        let (mut stack, columns) = stack_with(3);
        let header = stack.append_header_row();
        stack.prepend_header_row();
        let nodes_before = stack.tree().len();

        stack.remove_column(columns[1]).unwrap();
        assert_eq!(stack.columns(), vec![columns[0], columns[2]]);
        assert_eq!(stack.tree().len(), nodes_before - 2);
        assert_eq!(stack.row(header).unwrap().cells().len(), 2);
        assert!(matches!(
            stack.remove_column(columns[1]),
            Err(GridError::ColumnNotFound(_))
        ));
        stack.validate().unwrap();
    }

    #[test]
    fn test_remove_column_keeps_joined_group() {
        let (mut stack, columns) = stack_with(3);
        let header = stack.append_header_row();
        let cells = cell_ids(&stack, header);
        stack.join(header, &cells[0..2]).unwrap();

        stack.remove_column(columns[0]).unwrap();
        assert_eq!(stack.row(header).unwrap().cells().len(), 2);
        assert_eq!(stack.cell_columns(header, stack.row(header).unwrap().cells()[0].id()).unwrap(), vec![columns[1]]);
        stack.validate().unwrap();
    }

    #[test]
    fn test_remove_default_header_with_siblings_fails() {
        let (mut stack, _) = stack_with(2);
        let default = stack.append_header_row();
        stack.prepend_header_row();
        assert!(matches!(
            stack.remove_row(default),
            Err(GridError::DefaultHeaderRowInUse)
        ));
    }

    #[test]
    fn test_remove_layer_zero_row_pulls_outer_row_down() {
        let (mut stack, _) = stack_with(2);
        let outer = stack.append_header_row();
        let inner = stack.append_header_row();
        stack.row_mut(outer).unwrap().cells_mut()[0].set_text("Outer");

        stack.remove_row(inner).unwrap();
        assert_eq!(stack.layer_count(), 1);
        assert_eq!(stack.locate_row(outer), Some((0, RowKind::Header)));
        assert_eq!(stack.row(outer).unwrap().cells()[0].text(), Some("Outer"));
        assert_eq!(stack.default_header_row_id(), Some(outer));
        stack.validate().unwrap();
    }

    #[test]
    fn test_remove_layer_zero_row_rejects_joined_outer_row() {
        let (mut stack, _) = stack_with(3);
        let inner = stack.prepend_footer_row();
        let outer = stack.append_footer_row();
        let cells = cell_ids(&stack, outer);
        stack.join(outer, &cells[0..2]).unwrap();

        let err = stack.remove_row(inner).unwrap_err();
        assert!(matches!(err, GridError::RowArityMismatch { expected: 3, actual: 2, .. }));
        stack.validate().unwrap();
    }

    #[test]
    fn test_remove_unknown_row() {
        let (mut stack, _) = stack_with(1);
        let row = stack.append_footer_row();
        stack.remove_row(row).unwrap();
        assert!(matches!(stack.remove_row(row), Err(GridError::RowNotFound(_))));
    }

    #[test]
    fn test_join_on_layer_zero_relocates_row() {
        let (mut stack, columns) = stack_with(3);
        let header = stack.append_header_row();
        let cells = cell_ids(&stack, header);
        stack.row_mut(header).unwrap().cell_mut(cells[0]).unwrap().set_text("AB");

        let merged = stack.join(header, &[cells[1], cells[0]]).unwrap();
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.locate_row(header), Some((1, RowKind::Header)));
        assert_eq!(stack.cell(header, columns[0]).unwrap().id(), merged);
        assert_eq!(stack.cell(header, columns[1]).unwrap().id(), merged);
        assert_eq!(stack.cell(header, columns[0]).unwrap().text(), Some("AB"));
        assert_eq!(stack.cell_columns(header, merged).unwrap(), columns[0..2].to_vec());
        stack.validate().unwrap();
    }

    #[test]
    fn test_join_in_place_on_outer_layer() {
        let (mut stack, _) = stack_with(4);
        stack.append_header_row();
        let outer = stack.prepend_header_row();
        let cells = cell_ids(&stack, outer);

        stack.join(outer, &cells[0..2]).unwrap();
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.row(outer).unwrap().cells().len(), 3);

        let cells = cell_ids(&stack, outer);
        stack.join(outer, &cells[0..2]).unwrap();
        assert_eq!(stack.layer_count(), 2);
        assert_eq!(stack.row(outer).unwrap().cells().len(), 2);
        stack.validate().unwrap();
    }

    #[test]
    fn test_join_preconditions() {
        let (mut stack, _) = stack_with(3);
        let inner = stack.append_header_row();
        let outer = stack.prepend_header_row();
        let inner_cells = cell_ids(&stack, inner);
        let outer_cells = cell_ids(&stack, outer);

        assert!(matches!(
            stack.join(inner, &inner_cells[0..2]),
            Err(GridError::JoinNotOutermost(_))
        ));
        assert!(matches!(
            stack.join(outer, &outer_cells[0..1]),
            Err(GridError::JoinTooFewCells(1))
        ));
        assert!(matches!(
            stack.join(outer, &[outer_cells[0], inner_cells[1]]),
            Err(GridError::CellNotFound { .. })
        ));
        assert!(matches!(
            stack.join(outer, &[outer_cells[0], outer_cells[2]]),
            Err(GridError::JoinNotAdjacent)
        ));
        assert_eq!(stack.row(outer).unwrap().cells().len(), 3);
    }

    #[test]
    fn test_join_partial_overlap_is_rejected() {
        let (mut stack, _) = stack_with(3);
        let header = stack.append_header_row();
        let cells = cell_ids(&stack, header);
        stack.join(header, &cells[0..2]).unwrap();

        // A footer below the joined header group: join B and C.
        let footer = stack.append_footer_row();
        let footer_cells = cell_ids(&stack, footer);
        let before = stack.format_hierarchy(TreeFormatOptions::minimal());
        let err = stack.join(footer, &footer_cells[1..3]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Structure);
        assert_eq!(stack.format_hierarchy(TreeFormatOptions::minimal()), before);
        stack.validate().unwrap();
    }

    #[test]
    fn test_set_column_order() {
        let (mut stack, c) = stack_with(3);
        let header = stack.append_header_row();
        stack.cell_mut(header, c[2]).unwrap().set_text("C");

        stack.set_column_order(&[c[2], c[0], c[1]]).unwrap();
        assert_eq!(stack.columns(), vec![c[2], c[0], c[1]]);
        assert_eq!(stack.row(header).unwrap().cells()[0].text(), Some("C"));
        stack.validate().unwrap();
    }

    #[test]
    fn test_set_column_order_validation() {
        let (mut stack, c) = stack_with(3);
        let foreign = Column::<()>::new().id();
        assert!(matches!(
            stack.set_column_order(&[c[0], c[1], foreign]),
            Err(GridError::ColumnNotFound(_))
        ));
        assert!(matches!(
            stack.set_column_order(&[c[0], c[0], c[1]]),
            Err(GridError::DuplicateColumn(_))
        ));
        stack.set_column_label(c[2], "last");
        match stack.set_column_order(&[c[0], c[1]]) {
            Err(GridError::MissingColumns { missing }) => assert_eq!(missing, vec!["last"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
