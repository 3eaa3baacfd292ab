//! Horizon Grid - the server-side model of a data grid.
//!
//! The crate keeps the authoritative state of a grid whose rendering happens
//! elsewhere:
//!
//! - **Columns and groups**: a layered column hierarchy ([`ColumnLayerStack`])
//!   that supports header and footer rows, joined cells and reordering that
//!   never splits a group
//! - **Sorting**: in-memory comparators and backend sort clauses
//!   ([`sort`])
//! - **Selection**: single, multi and disabled selection models that keep the
//!   client in sync through a deferred update queue ([`selection`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::prelude::*;
//!
//! let data = Arc::new(ListDataView::new(vec!["a", "b", "c"], |s: &&str| ItemId::from(*s)));
//! let mut grid = Grid::new(data);
//!
//! let first = grid.add_column(Column::new().with_key("first")).unwrap();
//! let second = grid.add_column(Column::new().with_key("second")).unwrap();
//!
//! let top = grid.prepend_header_row();
//! let cells: Vec<CellId> = grid.layers().row(top).unwrap().cells().iter().map(Cell::id).collect();
//! let joined = grid.join(top, &cells).unwrap();
//! grid.cell_mut(top, first).unwrap().set_text("Name");
//! assert_eq!(grid.cell(top, second).unwrap().id(), joined);
//!
//! grid.select("b");
//! let mut sent: Vec<ClientUpdate<&str>> = Vec::new();
//! grid.flush_client_updates(&mut sent);
//! ```

pub mod client;
pub mod column;
pub mod config;
pub mod data;
mod error;
mod grid;
pub mod prelude;
pub mod selection;
pub mod sort;

pub use client::{ClientSync, ClientUpdate, SelectAllState, SorterIndicator};
pub use column::{
    Cell, CellContent, CellId, Column, ColumnId, ColumnLayerStack, ColumnTextAlign, Row, RowId, RowKind,
};
pub use config::{GridConfig, SelectAllCheckbox, SelectionMode, SelectionPreservation};
pub use data::{DataKind, DataView, ItemId, ListDataView, TreeDataView};
pub use error::{ErrorKind, GridError, Result};
pub use grid::{ColumnReorderEvent, ColumnResizeEvent, Grid, ItemFilter, SortEvent};
pub use selection::{MultiSelection, SelectionModel, SingleSelection};
pub use sort::{GridSortOrder, QuerySortOrder, SortDirection, SortKey};
