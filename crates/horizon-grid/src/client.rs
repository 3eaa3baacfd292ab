//! Outbound updates to the client-side grid.
//!
//! The grid never writes to the wire itself. Operations post tasks to the
//! grid's deferred queue; when the embedding layer flushes the queue at the
//! end of a turn, each task calls one of the [`ClientSync`] primitives.

use serde::Serialize;

use crate::column::{CellId, ColumnId};
use crate::sort::SortDirection;

/// State of the "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SelectAllState {
    /// Every item is selected.
    pub checked: bool,
    /// Some, but not provably all, items are selected.
    pub indeterminate: bool,
}

/// A sort indicator shown on the default header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorterIndicator {
    /// The sorted column.
    pub column: ColumnId,
    /// The default header row's cell covering the column.
    pub cell: CellId,
    /// Sort direction.
    pub direction: SortDirection,
    /// Position in the sort order, starting at 0.
    pub priority: usize,
}

/// Receives the grid's outbound update primitives.
pub trait ClientSync<T> {
    /// Mark materialized items as selected.
    fn push_incremental_select(&mut self, items: &[T]);

    /// Mark materialized items as deselected.
    fn push_incremental_deselect(&mut self, items: &[T]);

    /// Replace the sort indicators.
    fn push_sorter_indicators(&mut self, indicators: &[SorterIndicator]);

    /// Regenerate and resend one item.
    fn refresh_item(&mut self, item: &T);

    /// Update the "select all" checkbox.
    fn push_select_all_state(&mut self, state: SelectAllState);
}

/// One outbound update, as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate<T> {
    /// See [`ClientSync::push_incremental_select`].
    Select(Vec<T>),
    /// See [`ClientSync::push_incremental_deselect`].
    Deselect(Vec<T>),
    /// See [`ClientSync::push_sorter_indicators`].
    SorterIndicators(Vec<SorterIndicator>),
    /// See [`ClientSync::refresh_item`].
    Refresh(T),
    /// See [`ClientSync::push_select_all_state`].
    SelectAllState(SelectAllState),
}

/// Collects updates into a batch, in the order they were pushed.
impl<T: Clone> ClientSync<T> for Vec<ClientUpdate<T>> {
    fn push_incremental_select(&mut self, items: &[T]) {
        self.push(ClientUpdate::Select(items.to_vec()));
    }

    fn push_incremental_deselect(&mut self, items: &[T]) {
        self.push(ClientUpdate::Deselect(items.to_vec()));
    }

    fn push_sorter_indicators(&mut self, indicators: &[SorterIndicator]) {
        self.push(ClientUpdate::SorterIndicators(indicators.to_vec()));
    }

    fn refresh_item(&mut self, item: &T) {
        self.push(ClientUpdate::Refresh(item.clone()));
    }

    fn push_select_all_state(&mut self, state: SelectAllState) {
        self.push(ClientUpdate::SelectAllState(state));
    }
}
