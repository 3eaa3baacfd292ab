//! Logging and debugging facilities for Horizon Grid.
//!
//! This module provides:
//! - Target names for filtering the grid's `tracing` output by subsystem
//! - A generic tree formatter used to dump column hierarchies in diagnostics
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application or test:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::selection=debug")
//!     .init();
//! ```

use std::fmt::Write as FmtWrite;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Deferred client update target.
    pub const CLIENT: &str = "horizon_grid::client";
    /// Column tree target (adding/removing columns and groups).
    pub const COLUMNS: &str = "horizon_grid::columns";
    /// Header/footer row target.
    pub const ROWS: &str = "horizon_grid::rows";
    /// Column order reconciliation target.
    pub const REORDER: &str = "horizon_grid::reorder";
    /// Sorting target.
    pub const SORT: &str = "horizon_grid::sort";
    /// Selection model target.
    pub const SELECTION: &str = "horizon_grid::selection";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output (no ids, ASCII branches).
    pub fn minimal() -> Self {
        Self {
            style: TreeStyle::Ascii,
            show_ids: false,
            ..Default::default()
        }
    }
}

/// A tree that can be rendered by [`TreeFormatter`].
pub trait DebugTree {
    /// Node handle type.
    type Node: Copy;

    /// Top-level nodes, left to right.
    fn roots(&self) -> Vec<Self::Node>;

    /// Children of a node, left to right.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Human-readable label of a node.
    fn label(&self, node: Self::Node) -> String;

    /// Identifier shown when [`TreeFormatOptions::show_ids`] is set.
    fn id_label(&self, node: Self::Node) -> String;
}

/// Renders a [`DebugTree`] as indented text.
#[derive(Debug, Clone, Default)]
pub struct TreeFormatter {
    options: TreeFormatOptions,
}

impl TreeFormatter {
    /// Create a formatter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the whole tree.
    pub fn format<T: DebugTree>(&self, tree: &T) -> String {
        let roots = tree.roots();
        let mut output = String::new();
        if roots.is_empty() {
            output.push_str("(empty)\n");
            return output;
        }
        let count = roots.len();
        for (i, root) in roots.into_iter().enumerate() {
            self.format_subtree_into(tree, root, 0, i == count - 1, &mut output);
        }
        output
    }

    fn format_subtree_into<T: DebugTree>(
        &self,
        tree: &T,
        node: T::Node,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(&tree.label(node));
        if self.options.show_ids {
            // Writing to a String cannot fail.
            let _ = write!(output, " [{}]", tree.id_label(node));
        }
        output.push('\n');

        let children = tree.children(node);
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_subtree_into(tree, child, depth + 1, i == child_count - 1, output);
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
