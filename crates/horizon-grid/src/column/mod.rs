//! Columns, column groups, layers and header/footer rows.
//!
//! The grid's columns form a tree: data columns are leaves, column groups are
//! inner nodes. The tree is sliced horizontally into [`ColumnLayer`]s; layer 0
//! holds the leaves and every outer layer holds the groups one level up. Each
//! layer can carry one header row and one footer row whose cells line up 1:1
//! with the layer's nodes.
//!
//! ```text
//!  layer 2   |      G1(A,B)      |    G2(C)   |   <- outer header row
//!  layer 1   |  g(A)   |  g(B)   |    g(C)    |   <- header row
//!  layer 0   |   A     |   B     |     C      |   <- default header row
//! ```
//!
//! - [`Column`]: attributes of one data column
//! - [`ColumnTree`]: arena of leaf and group nodes
//! - [`ColumnLayerStack`]: layers, rows, joins, row insertion and removal
//! - [`ColumnOrderReconciler`]: applies a flat column order to the tree

mod layer;
mod reorder;
mod stack;
mod tree;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use layer::{Cell, CellContent, CellId, ColumnLayer, ComponentHandle, Row, RowId, RowKind};
pub use reorder::ColumnOrderReconciler;
pub use stack::ColumnLayerStack;
pub use tree::{ColumnTree, ColumnTreeDebug, Node, NodeId, NodeKind};

use crate::sort::{ItemComparator, QuerySortOrder, SortDirection, SortKey, SortOrderProvider};

/// Stable identity of a data column.
///
/// Ids are generated from a process-wide counter, so they are never reused
/// and a column id from one grid never matches a column of another grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(u64);

static NEXT_COLUMN_ID: AtomicU64 = AtomicU64::new(0);

impl ColumnId {
    fn next() -> Self {
        Self(NEXT_COLUMN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Parse the client-side column id (`col<N>`).
    pub fn parse(value: &str) -> Option<Self> {
        value.strip_prefix("col")?.parse().ok().map(Self)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col{}", self.0)
    }
}

impl FromStr for ColumnId {
    type Err = crate::GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::GridError::invalid(format!("'{s}' is not a column id")))
    }
}

/// Horizontal alignment of column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnTextAlign {
    /// Align to the start edge.
    #[default]
    Start,
    /// Center content.
    Center,
    /// Align to the end edge.
    End,
}

/// Generates an optional string for an item (class names, part names, tooltips).
pub type ItemTextGenerator<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// A data column of the grid.
///
/// Columns are created detached, configured with the `with_*` builders and
/// handed to [`crate::Grid::add_column`], which takes ownership.
pub struct Column<T> {
    id: ColumnId,
    key: Option<String>,
    sortable: bool,
    sort_order_provider: Option<SortOrderProvider>,
    comparator: Option<ItemComparator<T>>,
    frozen: bool,
    frozen_to_end: bool,
    width: Option<String>,
    flex_grow: u32,
    auto_width: bool,
    text_align: ColumnTextAlign,
    row_header: bool,
    visible: bool,
    resizable: bool,
    class_name_generator: Option<ItemTextGenerator<T>>,
    part_name_generator: Option<ItemTextGenerator<T>>,
    tooltip_generator: Option<ItemTextGenerator<T>>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Column<T> {
    /// Create a column with a fresh id and default attributes.
    pub fn new() -> Self {
        Self {
            id: ColumnId::next(),
            key: None,
            sortable: false,
            sort_order_provider: None,
            comparator: None,
            frozen: false,
            frozen_to_end: false,
            width: None,
            flex_grow: 1,
            auto_width: false,
            text_align: ColumnTextAlign::default(),
            row_header: false,
            visible: true,
            resizable: false,
            class_name_generator: None,
            part_name_generator: None,
            tooltip_generator: None,
        }
    }

    /// The column's id.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The user-assigned key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Assign the key before the column is added to a grid.
    ///
    /// Once added, use [`crate::Grid::set_column_key`] so uniqueness is checked.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = Some(key);
    }

    /// Name used for this column in client messages and backend sort clauses.
    pub fn client_id(&self) -> String {
        self.id.to_string()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Whether the column can be sorted.
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// Enable or disable sorting.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Set whether the column can be sorted.
    pub fn set_sortable(&mut self, sortable: bool) {
        self.sortable = sortable;
    }

    /// Use `comparator` for in-memory sorting. Makes the column sortable.
    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> std::cmp::Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self.sortable = true;
        self
    }

    /// Sort in memory by a [`SortKey`] extracted from each item.
    ///
    /// Makes the column sortable.
    pub fn with_sort_key<F, K>(self, extract: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Into<SortKey>,
    {
        self.with_comparator(move |a, b| {
            crate::sort::compare_sort_keys(&extract(a).into(), &extract(b).into())
        })
    }

    /// Map sort directions to backend sort clauses. Makes the column sortable.
    pub fn with_sort_order_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(SortDirection) -> Vec<QuerySortOrder> + Send + Sync + 'static,
    {
        self.sort_order_provider = Some(Arc::new(provider));
        self.sortable = true;
        self
    }

    /// Sort by the given backend properties, in order. Makes the column sortable.
    pub fn with_sort_properties<I, S>(self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        self.with_sort_order_provider(move |direction| {
            properties
                .iter()
                .map(|property| QuerySortOrder::new(property.clone(), direction))
                .collect()
        })
    }

    /// The in-memory comparator, if any.
    pub fn comparator(&self) -> Option<&ItemComparator<T>> {
        self.comparator.as_ref()
    }

    /// Backend sort clauses for `direction`.
    ///
    /// Without a provider a single clause on the key (or the client id) is used.
    pub fn sort_orders(&self, direction: SortDirection) -> Vec<QuerySortOrder> {
        match &self.sort_order_provider {
            Some(provider) => provider(direction),
            None => {
                let property = self.key.clone().unwrap_or_else(|| self.client_id());
                vec![QuerySortOrder::new(property, direction)]
            }
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Whether the column is frozen to the start edge.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze the column to the start edge.
    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Whether the column is frozen to the end edge.
    pub fn is_frozen_to_end(&self) -> bool {
        self.frozen_to_end
    }

    /// Freeze the column to the end edge.
    pub fn with_frozen_to_end(mut self, frozen_to_end: bool) -> Self {
        self.frozen_to_end = frozen_to_end;
        self
    }

    /// CSS width, e.g. `"120px"`.
    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    /// Set the CSS width.
    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Set the CSS width in place (used when the client resizes the column).
    pub fn set_width(&mut self, width: impl Into<String>) {
        self.width = Some(width.into());
    }

    /// Flex grow ratio.
    pub fn flex_grow(&self) -> u32 {
        self.flex_grow
    }

    /// Set the flex grow ratio.
    pub fn with_flex_grow(mut self, flex_grow: u32) -> Self {
        self.flex_grow = flex_grow;
        self
    }

    /// Whether the width is computed from content.
    pub fn is_auto_width(&self) -> bool {
        self.auto_width
    }

    /// Compute the width from content.
    pub fn with_auto_width(mut self, auto_width: bool) -> Self {
        self.auto_width = auto_width;
        self
    }

    /// Text alignment.
    pub fn text_align(&self) -> ColumnTextAlign {
        self.text_align
    }

    /// Set the text alignment.
    pub fn with_text_align(mut self, text_align: ColumnTextAlign) -> Self {
        self.text_align = text_align;
        self
    }

    /// Whether cells of this column act as row headers.
    pub fn is_row_header(&self) -> bool {
        self.row_header
    }

    /// Mark cells of this column as row headers.
    pub fn with_row_header(mut self, row_header: bool) -> Self {
        self.row_header = row_header;
        self
    }

    /// Whether the column is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the column.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the user may resize the column.
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Allow the user to resize the column.
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    // =========================================================================
    // Generators
    // =========================================================================

    /// Generate a CSS class name per item.
    pub fn with_class_name_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.class_name_generator = Some(Arc::new(generator));
        self
    }

    /// Generate a part name per item.
    pub fn with_part_name_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.part_name_generator = Some(Arc::new(generator));
        self
    }

    /// Generate a tooltip per item.
    pub fn with_tooltip_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.tooltip_generator = Some(Arc::new(generator));
        self
    }

    pub(crate) fn class_name(&self, item: &T) -> Option<String> {
        self.class_name_generator.as_ref().and_then(|g| g(item))
    }

    pub(crate) fn part_name(&self, item: &T) -> Option<String> {
        self.part_name_generator.as_ref().and_then(|g| g(item))
    }

    pub(crate) fn tooltip(&self, item: &T) -> Option<String> {
        self.tooltip_generator.as_ref().and_then(|g| g(item))
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("sortable", &self.sortable)
            .field("frozen", &self.frozen)
            .field("width", &self.width)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}
