//! Layers, header/footer rows and cells.

use std::sync::atomic::{AtomicU64, Ordering};

use super::NodeId;

/// Identity of a header or footer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

/// Identity of a header or footer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

impl RowId {
    fn next() -> Self {
        Self(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl CellId {
    fn next() -> Self {
        Self(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Header or footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// A header row, rendered above the data.
    Header,
    /// A footer row, rendered below the data.
    Footer,
}

impl RowKind {
    /// The other kind.
    pub fn other(self) -> Self {
        match self {
            Self::Header => Self::Footer,
            Self::Footer => Self::Header,
        }
    }
}

/// Opaque handle to a UI component owned by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(pub u64);

/// Content of a header or footer cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellContent {
    /// Nothing set.
    #[default]
    Empty,
    /// Plain text.
    Text(String),
    /// A single component.
    Component(ComponentHandle),
}

/// A header or footer cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    id: CellId,
    content: CellContent,
}

impl Cell {
    pub(crate) fn new() -> Self {
        Self {
            id: CellId::next(),
            content: CellContent::Empty,
        }
    }

    pub(crate) fn with_content(content: CellContent) -> Self {
        Self {
            id: CellId::next(),
            content,
        }
    }

    /// The cell's id.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The cell's content.
    pub fn content(&self) -> &CellContent {
        &self.content
    }

    /// Text content, if the cell holds text.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            CellContent::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Component content, if the cell holds a component.
    pub fn component(&self) -> Option<ComponentHandle> {
        match self.content {
            CellContent::Component(handle) => Some(handle),
            _ => None,
        }
    }

    /// Set text, replacing any component.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = CellContent::Text(text.into());
    }

    /// Set a component, replacing any text.
    pub fn set_component(&mut self, component: ComponentHandle) {
        self.content = CellContent::Component(component);
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content = CellContent::Empty;
    }

    pub(crate) fn take_content(&mut self) -> CellContent {
        std::mem::take(&mut self.content)
    }
}

/// A header or footer row. Its cells line up with the nodes of the layer it
/// is bound to.
#[derive(Debug, Clone)]
pub struct Row {
    id: RowId,
    kind: RowKind,
    cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(kind: RowKind, cell_count: usize) -> Self {
        Self {
            id: RowId::next(),
            kind,
            cells: (0..cell_count).map(|_| Cell::new()).collect(),
        }
    }

    /// The row's id.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Header or footer.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Cells, left to right.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell by id.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Mutable cell by id.
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == id)
    }

    /// Position of a cell in the row.
    pub fn position_of(&self, id: CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.id == id)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }

    pub(crate) fn set_cells(&mut self, cells: Vec<Cell>) {
        self.cells = cells;
    }
}

/// One level of the column hierarchy with its optional header and footer row.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayer {
    nodes: Vec<NodeId>,
    header: Option<Row>,
    footer: Option<Row>,
}

impl ColumnLayer {
    pub(crate) fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes,
            header: None,
            footer: None,
        }
    }

    /// Nodes, left to right.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Position of a node in this layer.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// The header row bound to this layer.
    pub fn header(&self) -> Option<&Row> {
        self.header.as_ref()
    }

    /// The footer row bound to this layer.
    pub fn footer(&self) -> Option<&Row> {
        self.footer.as_ref()
    }

    /// The row of `kind` bound to this layer.
    pub fn row(&self, kind: RowKind) -> Option<&Row> {
        match kind {
            RowKind::Header => self.header.as_ref(),
            RowKind::Footer => self.footer.as_ref(),
        }
    }

    /// Whether any row is bound to this layer.
    pub fn has_rows(&self) -> bool {
        self.header.is_some() || self.footer.is_some()
    }

    /// Rows bound to this layer, header first.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.header.iter().chain(self.footer.iter())
    }

    pub(crate) fn row_mut(&mut self, kind: RowKind) -> Option<&mut Row> {
        match kind {
            RowKind::Header => self.header.as_mut(),
            RowKind::Footer => self.footer.as_mut(),
        }
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.header.iter_mut().chain(self.footer.iter_mut())
    }

    pub(crate) fn take_row(&mut self, kind: RowKind) -> Option<Row> {
        match kind {
            RowKind::Header => self.header.take(),
            RowKind::Footer => self.footer.take(),
        }
    }

    /// Bind a row, returning the row previously bound for that kind.
    pub(crate) fn bind_row(&mut self, row: Row) -> Option<Row> {
        match row.kind {
            RowKind::Header => self.header.replace(row),
            RowKind::Footer => self.footer.replace(row),
        }
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.nodes
    }
}
