//! Multi selection with the "select all" tri-state.

use std::collections::{HashMap, HashSet};

use horizon_grid_core::logging::targets;
use horizon_grid_core::Signal;

use super::{fetch_every_item, SelectionContext};
use crate::client::SelectAllState;
use crate::config::SelectAllCheckbox;
use crate::data::{DataKind, DataView, ItemId};

/// Payload of [`MultiSelection::selection_changed`].
#[derive(Debug, Clone)]
pub struct MultiSelectionEvent<T> {
    /// Selection before the change, in selection order.
    pub old_selection: Vec<T>,
    /// Selection after the change, in selection order.
    pub new_selection: Vec<T>,
    /// Newly selected items.
    pub added: Vec<T>,
    /// Newly deselected items.
    pub removed: Vec<T>,
    /// Whether the change came from the client.
    pub user_originated: bool,
}

/// A selection of any number of items, kept in selection order.
pub struct MultiSelection<T> {
    // =========================================================================
    // State
    // =========================================================================
    /// Selected items by identity.
    items: HashMap<ItemId, T>,

    /// Identities in selection order.
    order: Vec<ItemId>,

    /// Checkbox state last queued for the client.
    last_select_all: SelectAllState,

    select_all_checkbox: SelectAllCheckbox,

    // =========================================================================
    // Signals
    // =========================================================================
    /// Emitted once per effective change.
    pub selection_changed: Signal<MultiSelectionEvent<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for MultiSelection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> MultiSelection<T> {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
            last_select_all: SelectAllState::default(),
            select_all_checkbox: SelectAllCheckbox::default(),
            selection_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the item with `id` is selected.
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Number of selected items.
    pub fn selected_count(&self) -> usize {
        self.order.len()
    }

    /// Selected items in selection order.
    pub fn selected_items(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id).cloned())
            .collect()
    }

    /// Selected identities in selection order.
    pub fn selected_ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Checkbox visibility setting.
    pub fn select_all_checkbox(&self) -> SelectAllCheckbox {
        self.select_all_checkbox
    }

    /// Change the checkbox visibility setting.
    pub fn set_select_all_checkbox(&mut self, visibility: SelectAllCheckbox) {
        self.select_all_checkbox = visibility;
    }

    /// Whether the checkbox is shown for `data`.
    pub fn is_select_all_checkbox_visible(&self, data: &dyn DataView<T>) -> bool {
        match self.select_all_checkbox {
            SelectAllCheckbox::Visible => true,
            SelectAllCheckbox::Hidden => false,
            SelectAllCheckbox::Default => data.kind() == DataKind::InMemory,
        }
    }

    /// Tri-state of the "select all" checkbox.
    ///
    /// `checked` requires a flat view of known, non-zero size with every item
    /// selected. Hierarchical views and views of unknown size can only ever
    /// be `indeterminate`.
    pub fn select_all_state(&self, data: &dyn DataView<T>) -> SelectAllState {
        let selected = self.order.len();
        let size = if data.is_hierarchical() { None } else { data.size() };
        SelectAllState {
            checked: size.is_some_and(|size| size > 0 && selected == size),
            indeterminate: selected > 0 && size.is_none_or(|size| selected < size),
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Select `added` and deselect `removed` in one step.
    ///
    /// Items present in both sets cancel out. Returns whether the selection
    /// changed.
    pub fn update_selection(
        &mut self,
        ctx: &mut SelectionContext<'_, T>,
        added: Vec<T>,
        removed: Vec<T>,
    ) -> bool {
        self.apply_update(ctx, added, removed, false)
    }

    /// Select every item of the view.
    ///
    /// Hierarchical views are walked depth-first instead of fetched flat.
    pub fn select_all(&mut self, ctx: &mut SelectionContext<'_, T>) -> bool {
        let items = fetch_every_item(ctx.data);
        self.apply_update(ctx, items, Vec::new(), false)
    }

    /// Deselect every item.
    pub fn deselect_all(&mut self, ctx: &mut SelectionContext<'_, T>) -> bool {
        let items = self.selected_items();
        self.apply_update(ctx, Vec::new(), items, false)
    }

    pub(crate) fn select_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> bool {
        self.apply_update(ctx, vec![item], Vec::new(), true)
    }

    pub(crate) fn deselect_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> bool {
        self.apply_update(ctx, Vec::new(), vec![item], true)
    }

    pub(crate) fn select_all_from_client(&mut self, ctx: &mut SelectionContext<'_, T>) -> bool {
        let items = fetch_every_item(ctx.data);
        self.apply_update(ctx, items, Vec::new(), true)
    }

    pub(crate) fn deselect_all_from_client(&mut self, ctx: &mut SelectionContext<'_, T>) -> bool {
        let items = self.selected_items();
        self.apply_update(ctx, Vec::new(), items, true)
    }

    /// Queue the checkbox state for the client if it changed since the last push.
    ///
    /// The state depends on the data as well as the selection, so this also
    /// runs after the data changed.
    pub(crate) fn sync_select_all_state(&mut self, ctx: &mut SelectionContext<'_, T>) {
        let state = self.select_all_state(ctx.data);
        if self.last_select_all == state {
            return;
        }
        self.last_select_all = state;
        ctx.updates.post("push_select_all_state", move |client| {
            client.push_select_all_state(state)
        });
    }

    fn apply_update(
        &mut self,
        ctx: &mut SelectionContext<'_, T>,
        added: Vec<T>,
        removed: Vec<T>,
        user_originated: bool,
    ) -> bool {
        let data = ctx.data;
        let removed_ids: HashSet<ItemId> = removed.iter().map(|item| data.id_of(item)).collect();
        let added_ids: HashSet<ItemId> = added.iter().map(|item| data.id_of(item)).collect();

        let mut seen = HashSet::new();
        let to_add: Vec<(ItemId, T)> = added
            .into_iter()
            .map(|item| (data.id_of(&item), item))
            .filter(|(id, _)| !removed_ids.contains(id) && !self.items.contains_key(id))
            .filter(|(id, _)| seen.insert(id.clone()))
            .collect();
        let removes = |id: &ItemId| removed_ids.contains(id) && !added_ids.contains(id);
        let to_remove: Vec<ItemId> = self.order.iter().filter(|id| removes(*id)).cloned().collect();

        if to_add.is_empty() && to_remove.is_empty() {
            return false;
        }

        let old_selection = self.selected_items();
        let removed_items: Vec<T> = to_remove
            .iter()
            .filter_map(|id| self.items.remove(id))
            .collect();
        self.order.retain(|id| !removes(id));

        let mut added_items = Vec::with_capacity(to_add.len());
        for (id, item) in to_add {
            added_items.push(item.clone());
            self.order.push(id.clone());
            self.items.insert(id, item);
        }

        tracing::debug!(
            target: targets::SELECTION,
            added = added_items.len(),
            removed = removed_items.len(),
            selected = self.order.len(),
            user_originated,
            "multi selection changed"
        );

        if !user_originated {
            let select: Vec<T> = added_items.iter().filter(|i| data.is_active(i)).cloned().collect();
            let deselect: Vec<T> = removed_items.iter().filter(|i| data.is_active(i)).cloned().collect();
            if !select.is_empty() {
                ctx.updates.post("push_incremental_select", move |client| {
                    client.push_incremental_select(&select)
                });
            }
            if !deselect.is_empty() {
                ctx.updates.post("push_incremental_deselect", move |client| {
                    client.push_incremental_deselect(&deselect)
                });
            }
        }

        self.sync_select_all_state(ctx);

        self.selection_changed.emit(MultiSelectionEvent {
            old_selection,
            new_selection: self.selected_items(),
            added: added_items,
            removed: removed_items,
            user_originated,
        });
        true
    }
}

impl<T> std::fmt::Debug for MultiSelection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSelection")
            .field("selected", &self.order)
            .field("select_all_checkbox", &self.select_all_checkbox)
            .finish_non_exhaustive()
    }
}
