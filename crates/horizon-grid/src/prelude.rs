//! Prelude module for Horizon Grid.
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```

// ============================================================================
// Grid
// ============================================================================

pub use crate::config::{GridConfig, SelectionMode, SelectionPreservation};
pub use crate::error::{GridError, Result};
pub use crate::grid::Grid;

// ============================================================================
// Columns, rows and cells
// ============================================================================

pub use crate::column::{Cell, CellId, Column, ColumnId, Row, RowId};
pub use crate::sort::{GridSortOrder, SortDirection};

// ============================================================================
// Data and client sync
// ============================================================================

pub use crate::client::{ClientSync, ClientUpdate};
pub use crate::data::{DataView, ItemId, ListDataView, TreeDataView};

pub use horizon_grid_core::Signal;
