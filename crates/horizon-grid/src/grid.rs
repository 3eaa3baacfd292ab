//! The [`Grid`] facade.
//!
//! A grid owns its columns, the layer stack with the header and footer rows,
//! the sort order and the selection model. It reads items through a
//! [`DataView`] and talks to the client only through its deferred update
//! queue, which the embedding layer flushes once per turn with
//! [`Grid::flush_client_updates`].
//!
//! Operations come in two flavours. Programmatic calls (`select`, `sort`,
//! `set_column_order`, ...) queue whatever the client needs to catch up.
//! Client-originated calls (`select_item`, `sorters_changed`,
//! `columns_reordered`, ...) describe something the client already shows;
//! they resolve client keys first and drop stale ones with a warning.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{DeferredQueue, Signal, TaskId, TreeFormatOptions};
use serde_json::{Map, Value};

use crate::client::{ClientSync, SelectAllState, SorterIndicator};
use crate::column::{Cell, CellId, Column, ColumnId, ColumnLayerStack, Row, RowId};
use crate::config::{GridConfig, SelectionMode, SelectionPreservation};
use crate::data::DataView;
use crate::error::{GridError, Result};
use crate::selection::{SelectionContext, SelectionModel};
use crate::sort::{chain_comparators, GridSortOrder, ItemComparator, QuerySortOrder, SortDirection};

/// Decides per item whether drag (or drop) is allowed.
pub type ItemFilter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Payload of [`Grid::sort_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEvent {
    /// The new sort order.
    pub sort_order: Vec<GridSortOrder>,
    /// Whether the change came from the client.
    pub user_originated: bool,
}

/// Payload of [`Grid::column_reordered`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReorderEvent {
    /// Columns in their new order.
    pub columns: Vec<ColumnId>,
    /// Whether the change came from the client.
    pub user_originated: bool,
}

/// Payload of [`Grid::column_resized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResizeEvent {
    /// The resized column.
    pub column: ColumnId,
    /// Its new CSS width.
    pub width: String,
}

/// Server-side model of a data grid.
pub struct Grid<T> {
    config: GridConfig,
    data: Arc<dyn DataView<T>>,
    columns: HashMap<ColumnId, Column<T>>,
    keys: HashMap<String, ColumnId>,
    layers: ColumnLayerStack,
    sort_order: Vec<GridSortOrder>,
    selection: SelectionModel<T>,
    updates: DeferredQueue<dyn ClientSync<T>>,
    last_indicators: Vec<SorterIndicator>,
    pending_indicators: Option<TaskId>,
    drag_filter: Option<ItemFilter<T>>,
    drop_filter: Option<ItemFilter<T>>,

    /// Emitted when the sort order changes.
    pub sort_changed: Signal<SortEvent>,
    /// Emitted after the column order changed.
    pub column_reordered: Signal<ColumnReorderEvent>,
    /// Emitted when the client resized a column.
    pub column_resized: Signal<ColumnResizeEvent>,
}

impl<T: Clone + Send + Sync + 'static> Grid<T> {
    /// Create a grid over `data` with the default configuration.
    pub fn new(data: Arc<dyn DataView<T>>) -> Self {
        Self::with_config(data, GridConfig::default())
    }

    /// Create a grid over `data` with `config`.
    pub fn with_config(data: Arc<dyn DataView<T>>, config: GridConfig) -> Self {
        Self {
            selection: SelectionModel::from_config(&config),
            config,
            data,
            columns: HashMap::new(),
            keys: HashMap::new(),
            layers: ColumnLayerStack::new(),
            sort_order: Vec::new(),
            updates: DeferredQueue::new(),
            last_indicators: Vec::new(),
            pending_indicators: None,
            drag_filter: None,
            drop_filter: None,
            sort_changed: Signal::new(),
            column_reordered: Signal::new(),
            column_resized: Signal::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Allow or forbid multi-column sorting.
    pub fn set_multi_sort(&mut self, multi_sort: bool) {
        self.config.multi_sort = multi_sort;
    }

    /// Allow or forbid column reordering by the client.
    pub fn set_column_reordering_allowed(&mut self, allowed: bool) {
        self.config.column_reordering_allowed = allowed;
    }

    /// Change what happens to the selection on [`Grid::data_refreshed`].
    pub fn set_selection_preservation(&mut self, policy: SelectionPreservation) {
        self.config.selection_preservation = policy;
    }

    // =========================================================================
    // Client updates
    // =========================================================================

    /// Run every update queued during this turn against `client`, in order.
    ///
    /// Returns the number of updates sent.
    pub fn flush_client_updates(&mut self, client: &mut (dyn ClientSync<T> + 'static)) -> usize {
        self.pending_indicators = None;
        if !self.updates.has_pending() {
            return 0;
        }
        let sent = self.updates.flush(client);
        tracing::trace!(target: targets::CLIENT, sent, "client updates flushed");
        sent
    }

    /// Number of queued client updates.
    pub fn pending_client_updates(&self) -> usize {
        self.updates.pending_count()
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// The data view.
    pub fn data(&self) -> &Arc<dyn DataView<T>> {
        &self.data
    }

    /// Swap the data view. The selection is always cleared.
    pub fn set_data_view(&mut self, data: Arc<dyn DataView<T>>) {
        self.with_selection(|model, ctx| model.deselect_all(ctx));
        self.data = data;
        self.with_selection(|model, ctx| model.sync_select_all_state(ctx));
    }

    /// The data behind the view changed; apply the preservation policy.
    pub fn data_refreshed(&mut self) {
        let policy = self.config.selection_preservation;
        self.with_selection(|model, ctx| model.data_refreshed(ctx, policy));
    }

    /// Disable dragging for items the filter rejects.
    pub fn set_drag_filter<F>(&mut self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.drag_filter = Some(Arc::new(filter));
    }

    /// Disable dropping onto items the filter rejects.
    pub fn set_drop_filter<F>(&mut self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.drop_filter = Some(Arc::new(filter));
    }

    /// Per-item record entries for the rendering layer.
    ///
    /// Adds `selected`, per-column `style` / `part` / `tooltip` objects keyed
    /// by client column id, and `dragDisabled` / `dropDisabled`.
    pub fn generate_data(&self, item: &T) -> Map<String, Value> {
        let mut record = Map::new();
        if self.selection.is_selected(&self.data.id_of(item)) {
            record.insert("selected".into(), Value::Bool(true));
        }

        let mut style = Map::new();
        let mut part = Map::new();
        let mut tooltip = Map::new();
        for column in self.columns() {
            let id = column.client_id();
            if let Some(class_name) = column.class_name(item) {
                style.insert(id.clone(), Value::String(class_name));
            }
            if let Some(part_name) = column.part_name(item) {
                part.insert(id.clone(), Value::String(part_name));
            }
            if let Some(text) = column.tooltip(item) {
                tooltip.insert(id, Value::String(text));
            }
        }
        for (name, entries) in [("style", style), ("part", part), ("tooltip", tooltip)] {
            if !entries.is_empty() {
                record.insert(name.into(), Value::Object(entries));
            }
        }

        if self.drag_filter.as_ref().is_some_and(|allows| !allows(item)) {
            record.insert("dragDisabled".into(), Value::Bool(true));
        }
        if self.drop_filter.as_ref().is_some_and(|allows| !allows(item)) {
            record.insert("dropDisabled".into(), Value::Bool(true));
        }
        record
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Add a column at the end.
    pub fn add_column(&mut self, column: Column<T>) -> Result<ColumnId> {
        let id = column.id();
        if let Some(key) = column.key() {
            if self.keys.contains_key(key) {
                return Err(GridError::DuplicateKey(key.to_string()));
            }
        }
        self.layers.add_column(id)?;
        if let Some(key) = column.key() {
            self.keys.insert(key.to_string(), id);
            self.layers.set_column_label(id, key);
        }
        self.columns.insert(id, column);
        Ok(id)
    }

    /// Remove a column together with its cells, empty groups and sort entry.
    pub fn remove_column(&mut self, id: ColumnId) -> Result<()> {
        self.layers.remove_column(id)?;
        if let Some(column) = self.columns.remove(&id) {
            if let Some(key) = column.key() {
                self.keys.remove(key);
            }
        }
        let before = self.sort_order.len();
        self.sort_order.retain(|order| order.column != id);
        if self.sort_order.len() != before {
            self.sort_changed.emit(SortEvent {
                sort_order: self.sort_order.clone(),
                user_originated: false,
            });
        }
        self.sync_sorter_indicators();
        Ok(())
    }

    /// Look up a column.
    pub fn column(&self, id: ColumnId) -> Option<&Column<T>> {
        self.columns.get(&id)
    }

    /// Look up a column for configuration.
    pub fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column<T>> {
        self.columns.get_mut(&id)
    }

    /// Look up a column by key.
    pub fn column_by_key(&self, key: &str) -> Option<&Column<T>> {
        self.keys.get(key).and_then(|id| self.columns.get(id))
    }

    /// Columns in display order.
    pub fn columns(&self) -> Vec<&Column<T>> {
        self.layers
            .columns()
            .into_iter()
            .filter_map(|id| self.columns.get(&id))
            .collect()
    }

    /// Column ids in display order.
    pub fn column_order(&self) -> Vec<ColumnId> {
        self.layers.columns()
    }

    /// Assign a column's key. Keys are unique within the grid and cannot be
    /// changed once set.
    pub fn set_column_key(&mut self, id: ColumnId, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        let column = self.columns.get_mut(&id).ok_or(GridError::ColumnNotFound(id))?;
        match column.key() {
            Some(existing) if existing == key => return Ok(()),
            Some(existing) => {
                return Err(GridError::KeyAlreadySet {
                    column: id,
                    key: existing.to_string(),
                });
            }
            None => {}
        }
        if self.keys.contains_key(&key) {
            return Err(GridError::DuplicateKey(key));
        }
        column.set_key(key.clone());
        self.layers.set_column_label(id, key.clone());
        self.keys.insert(key, id);
        Ok(())
    }

    /// Rearrange the columns into `order`.
    ///
    /// `order` must list every column once, and must not split any column
    /// group. Nothing changes on error.
    pub fn set_column_order(&mut self, order: Vec<ColumnId>) -> Result<()> {
        self.reorder(order, false)
    }

    fn reorder(&mut self, order: Vec<ColumnId>, user_originated: bool) -> Result<()> {
        self.layers.set_column_order(&order)?;
        self.sync_sorter_indicators();
        self.column_reordered.emit(ColumnReorderEvent {
            columns: order,
            user_originated,
        });
        Ok(())
    }

    // =========================================================================
    // Header and footer rows
    // =========================================================================

    /// The layer stack.
    pub fn layers(&self) -> &ColumnLayerStack {
        &self.layers
    }

    /// Add a header row below the existing ones.
    pub fn append_header_row(&mut self) -> RowId {
        let id = self.layers.append_header_row();
        self.sync_sorter_indicators();
        id
    }

    /// Add a header row above the existing ones.
    pub fn prepend_header_row(&mut self) -> RowId {
        let id = self.layers.prepend_header_row();
        self.sync_sorter_indicators();
        id
    }

    /// Add a footer row below the existing ones.
    pub fn append_footer_row(&mut self) -> RowId {
        self.layers.append_footer_row()
    }

    /// Add a footer row above the existing ones.
    pub fn prepend_footer_row(&mut self) -> RowId {
        self.layers.prepend_footer_row()
    }

    /// Remove a header or footer row.
    pub fn remove_row(&mut self, row: RowId) -> Result<()> {
        self.layers.remove_row(row)?;
        self.sync_sorter_indicators();
        Ok(())
    }

    /// Header rows, top to bottom.
    pub fn header_rows(&self) -> Vec<&Row> {
        self.layers.header_rows()
    }

    /// Footer rows, top to bottom.
    pub fn footer_rows(&self) -> Vec<&Row> {
        self.layers.footer_rows()
    }

    /// The header row that shows the sort indicators.
    pub fn default_header_row(&self) -> Option<&Row> {
        self.layers.default_header_row()
    }

    /// Join adjacent cells of the outermost header or footer row.
    pub fn join(&mut self, row: RowId, cells: &[CellId]) -> Result<CellId> {
        let merged = self.layers.join(row, cells)?;
        self.sync_sorter_indicators();
        Ok(merged)
    }

    /// The cell of `row` covering `column`.
    pub fn cell(&self, row: RowId, column: ColumnId) -> Result<&Cell> {
        self.layers.cell(row, column)
    }

    /// Mutable access to the cell of `row` covering `column`.
    pub fn cell_mut(&mut self, row: RowId, column: ColumnId) -> Result<&mut Cell> {
        self.layers.cell_mut(row, column)
    }

    /// Check the layer stack's structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.layers.validate()
    }

    /// Render the column hierarchy for diagnostics.
    pub fn debug_hierarchy(&self) -> String {
        self.layers.format_hierarchy(TreeFormatOptions::default())
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// The current sort order.
    pub fn sort_order(&self) -> &[GridSortOrder] {
        &self.sort_order
    }

    /// Sort programmatically. Without multi-sort only the first entry is kept.
    pub fn sort(&mut self, orders: Vec<GridSortOrder>) -> Result<()> {
        for order in &orders {
            let column = self
                .columns
                .get(&order.column)
                .ok_or(GridError::ColumnNotFound(order.column))?;
            if !column.is_sortable() {
                return Err(GridError::ColumnNotSortable(order.column));
            }
        }
        self.set_sort_order(orders, false);
        self.sync_sorter_indicators();
        Ok(())
    }

    /// The client changed its sorters.
    ///
    /// Unknown and unsortable columns are skipped with a warning.
    pub fn sorters_changed(&mut self, sorters: Vec<(String, SortDirection)>) -> Result<()> {
        let mut orders = Vec::with_capacity(sorters.len());
        for (client_id, direction) in sorters {
            let Some(column) = ColumnId::parse(&client_id).and_then(|id| self.columns.get(&id)) else {
                tracing::warn!(target: targets::SORT, column = %client_id, "sorter for unknown column ignored");
                continue;
            };
            if !column.is_sortable() {
                tracing::warn!(target: targets::SORT, column = %client_id, "sorter for unsortable column ignored");
                continue;
            }
            orders.push(GridSortOrder {
                column: column.id(),
                direction,
            });
        }
        self.set_sort_order(orders, true);
        // The client already shows these indicators.
        self.cancel_pending_indicators();
        self.last_indicators = self.sorter_indicators();
        Ok(())
    }

    fn set_sort_order(&mut self, mut orders: Vec<GridSortOrder>, user_originated: bool) {
        if !self.config.multi_sort {
            orders.truncate(1);
        }
        tracing::debug!(target: targets::SORT, orders = orders.len(), user_originated, "sort order changed");
        self.sort_order = orders;
        self.sort_changed.emit(SortEvent {
            sort_order: self.sort_order.clone(),
            user_originated,
        });
    }

    /// Sort indicators for the default header row, in priority order.
    pub fn sorter_indicators(&self) -> Vec<SorterIndicator> {
        let Some(row) = self.layers.default_header_row_id() else {
            return Vec::new();
        };
        self.sort_order
            .iter()
            .enumerate()
            .filter_map(|(priority, order)| {
                let cell = self.layers.cell(row, order.column).ok()?;
                Some(SorterIndicator {
                    column: order.column,
                    cell: cell.id(),
                    direction: order.direction,
                    priority,
                })
            })
            .collect()
    }

    fn sync_sorter_indicators(&mut self) {
        let indicators = self.sorter_indicators();
        if indicators == self.last_indicators {
            return;
        }
        self.last_indicators = indicators.clone();
        self.cancel_pending_indicators();
        let task = self.updates.post("push_sorter_indicators", move |client| {
            client.push_sorter_indicators(&indicators)
        });
        self.pending_indicators = Some(task);
    }

    /// Drop a queued indicator push that newer state has superseded.
    fn cancel_pending_indicators(&mut self) {
        if let Some(task) = self.pending_indicators.take() {
            self.updates.cancel(task);
        }
    }

    /// Comparator for sorting items in memory by the current sort order.
    ///
    /// Columns without a comparator are skipped; `None` when nothing is left.
    pub fn in_memory_comparator(&self) -> Option<ItemComparator<T>> {
        let comparators: Vec<ItemComparator<T>> = self
            .sort_order
            .iter()
            .filter_map(|order| {
                let comparator = self.columns.get(&order.column)?.comparator()?.clone();
                let direction = order.direction;
                Some(Arc::new(move |a: &T, b: &T| direction.apply(comparator(a, b))) as ItemComparator<T>)
            })
            .collect();
        (!comparators.is_empty()).then(|| chain_comparators(comparators))
    }

    /// Backend sort clauses for the current sort order.
    pub fn backend_sort_orders(&self) -> Vec<QuerySortOrder> {
        self.sort_order
            .iter()
            .filter_map(|order| {
                self.columns
                    .get(&order.column)
                    .map(|column| column.sort_orders(order.direction))
            })
            .flatten()
            .collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn with_selection<R>(
        &mut self,
        op: impl FnOnce(&mut SelectionModel<T>, &mut SelectionContext<'_, T>) -> R,
    ) -> R {
        let mut ctx = SelectionContext {
            data: self.data.as_ref(),
            updates: &mut self.updates,
        };
        op(&mut self.selection, &mut ctx)
    }

    /// The selection model.
    pub fn selection(&self) -> &SelectionModel<T> {
        &self.selection
    }

    /// Switch selection models. The current selection is cleared first.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if mode == self.selection.mode() {
            return;
        }
        self.with_selection(|model, ctx| model.deselect_all(ctx));
        self.config.selection_mode = mode;
        self.selection = SelectionModel::from_config(&self.config);
    }

    /// State of the "select all" checkbox; `None` unless multi selection is active.
    pub fn select_all_state(&self) -> Option<SelectAllState> {
        self.selection
            .as_multi()
            .map(|multi| multi.select_all_state(self.data.as_ref()))
    }

    /// Whether `item` is selected.
    pub fn is_selected(&self, item: &T) -> bool {
        self.selection.is_selected(&self.data.id_of(item))
    }

    /// Selected items in selection order.
    pub fn selected_items(&self) -> Vec<T> {
        self.selection.selected_items()
    }

    /// Select an item.
    pub fn select(&mut self, item: T) {
        self.with_selection(|model, ctx| model.select(ctx, item));
    }

    /// Deselect an item.
    pub fn deselect(&mut self, item: T) {
        self.with_selection(|model, ctx| model.deselect(ctx, item));
    }

    /// Select every item. Only multi selection supports this.
    pub fn select_all(&mut self) -> bool {
        self.with_selection(|model, ctx| match model {
            SelectionModel::Multi(multi) => multi.select_all(ctx),
            _ => false,
        })
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.with_selection(|model, ctx| model.deselect_all(ctx));
    }

    /// The client selected the item with `key`.
    pub fn select_item(&mut self, key: &str) -> Result<()> {
        let Some(item) = self.data.item_for_key(key) else {
            tracing::warn!(target: targets::SELECTION, key, "select for unknown key ignored");
            return Ok(());
        };
        self.with_selection(|model, ctx| model.select_from_client(ctx, item))
    }

    /// The client deselected the item with `key`.
    pub fn deselect_item(&mut self, key: &str) -> Result<()> {
        let Some(item) = self.data.item_for_key(key) else {
            tracing::warn!(target: targets::SELECTION, key, "deselect for unknown key ignored");
            return Ok(());
        };
        self.with_selection(|model, ctx| model.deselect_from_client(ctx, item))
    }

    /// The client checked the "select all" checkbox.
    pub fn select_all_from_client(&mut self) -> Result<()> {
        self.with_selection(|model, ctx| model.select_all_from_client(ctx))
    }

    /// The client unchecked the "select all" checkbox.
    pub fn deselect_all_from_client(&mut self) -> Result<()> {
        self.with_selection(|model, ctx| model.deselect_all_from_client(ctx))
    }

    // =========================================================================
    // Inbound column messages
    // =========================================================================

    /// The client reordered the columns.
    ///
    /// An order naming a column this grid no longer has is dropped with a
    /// warning.
    pub fn columns_reordered(&mut self, client_ids: &[String]) -> Result<()> {
        if !self.config.column_reordering_allowed {
            tracing::error!(target: targets::REORDER, "client reordered columns although reordering is disabled");
            return Err(GridError::ColumnReorderingDisabled);
        }
        let mut order = Vec::with_capacity(client_ids.len());
        for client_id in client_ids {
            match ColumnId::parse(client_id).filter(|id| self.columns.contains_key(id)) {
                Some(id) => order.push(id),
                None => {
                    tracing::warn!(target: targets::REORDER, column = %client_id, "column order with unknown column ignored");
                    return Ok(());
                }
            }
        }
        self.reorder(order, true)
    }

    /// The client resized a column.
    pub fn column_resized(&mut self, client_id: &str, width: impl Into<String>) -> Result<()> {
        let Some(column) = ColumnId::parse(client_id).and_then(|id| self.columns.get_mut(&id)) else {
            tracing::warn!(target: targets::COLUMNS, column = %client_id, "resize of unknown column ignored");
            return Ok(());
        };
        let width = width.into();
        column.set_width(width.clone());
        let column = column.id();
        self.column_resized.emit(ColumnResizeEvent { column, width });
        Ok(())
    }
}

impl<T> std::fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("config", &self.config)
            .field("columns", &self.columns.len())
            .field("layers", &self.layers.layer_count())
            .field("sort_order", &self.sort_order)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
