//! Error types for the grid model.

use crate::column::{CellId, ColumnId, RowId};

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Broad classification of a [`GridError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed invalid input. Nothing was mutated.
    Usage,
    /// The request cannot be represented by the layered column hierarchy.
    /// Nothing was mutated.
    Structure,
    /// Client and server state disagree; treat as fatal.
    Protocol,
    /// The grid's own bookkeeping is inconsistent (a defect).
    Internal,
    /// Configuration could not be loaded.
    Config,
}

/// Errors that can occur while manipulating a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Generic argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The column is not part of this grid.
    #[error("Column {0} does not belong to this grid")]
    ColumnNotFound(ColumnId),

    /// A column appears more than once in a requested order.
    #[error("Column {0} appears more than once in the requested order")]
    DuplicateColumn(ColumnId),

    /// A requested order does not mention every column.
    #[error("The requested order is missing columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Another column already uses the key.
    #[error("Duplicate column key '{0}'")]
    DuplicateKey(String),

    /// Column keys are immutable once set.
    #[error("Column {column} already has key '{key}'")]
    KeyAlreadySet { column: ColumnId, key: String },

    /// The column is not sortable.
    #[error("Column {0} is not sortable")]
    ColumnNotSortable(ColumnId),

    /// The row is not part of this grid.
    #[error("Row {0:?} is not part of this grid")]
    RowNotFound(RowId),

    /// The cell does not belong to the row.
    #[error("Cell {cell:?} does not belong to row {row:?}")]
    CellNotFound { row: RowId, cell: CellId },

    /// The default header row cannot be removed while other header rows exist.
    #[error("The default header row cannot be removed while other header rows exist")]
    DefaultHeaderRowInUse,

    /// A row would have to move onto a layer with a different number of nodes.
    #[error("Row {row:?} has {actual} cells but the receiving layer has {expected} columns")]
    RowArityMismatch {
        row: RowId,
        expected: usize,
        actual: usize,
    },

    /// Cells can only be joined on the outermost row of their kind.
    #[error("Cells can only be joined on the outermost header or footer row")]
    JoinNotOutermost(RowId),

    /// Fewer than two cells were passed to a join.
    #[error("At least two cells are required for a join, got {0}")]
    JoinTooFewCells(usize),

    /// The cells passed to a join are not adjacent.
    #[error("Only adjacent cells can be joined")]
    JoinNotAdjacent,

    /// The hierarchy cannot express the requested join or reorder.
    #[error("{message}\nCurrent column hierarchy:\n{hierarchy}")]
    UnsupportedHierarchy { message: String, hierarchy: String },

    /// The client changed selection although selection is disabled.
    #[error("Client tried to update selection although the selection mode is NONE")]
    SelectionDisabled,

    /// Column reordering by the client is disabled.
    #[error("Client reordered columns although column reordering is not allowed")]
    ColumnReorderingDisabled,

    /// Internal bookkeeping is inconsistent.
    #[error("Internal grid inconsistency: {0}")]
    Internal(String),

    /// TOML configuration could not be parsed.
    #[error("Failed to parse grid configuration: {0}")]
    ConfigToml(#[from] toml::de::Error),

    /// JSON configuration could not be parsed.
    #[error("Failed to parse grid configuration: {0}")]
    ConfigJson(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("Failed to read grid configuration '{path}': {source}")]
    ConfigIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GridError {
    /// Create an argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a structure error carrying a hierarchy dump.
    pub fn unsupported(message: impl Into<String>, hierarchy: impl Into<String>) -> Self {
        Self::UnsupportedHierarchy {
            message: message.into(),
            hierarchy: hierarchy.into(),
        }
    }

    /// Create an internal consistency error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedHierarchy { .. } => ErrorKind::Structure,
            Self::SelectionDisabled | Self::ColumnReorderingDisabled => ErrorKind::Protocol,
            Self::Internal(_) => ErrorKind::Internal,
            Self::ConfigToml(_) | Self::ConfigJson(_) | Self::ConfigIo { .. } => ErrorKind::Config,
            _ => ErrorKind::Usage,
        }
    }

    /// True for errors that indicate a client/server state mismatch.
    pub fn is_protocol_violation(&self) -> bool {
        self.kind() == ErrorKind::Protocol
    }
}
