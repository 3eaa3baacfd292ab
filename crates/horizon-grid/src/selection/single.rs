//! Single selection.

use horizon_grid_core::logging::targets;
use horizon_grid_core::Signal;

use super::SelectionContext;
use crate::data::ItemId;

/// Payload of [`SingleSelection::selection_changed`].
#[derive(Debug, Clone)]
pub struct SingleSelectionEvent<T> {
    /// Previously selected item.
    pub old_value: Option<T>,
    /// Newly selected item.
    pub new_value: Option<T>,
    /// Whether the change came from the client.
    pub user_originated: bool,
}

/// A selection of at most one item.
pub struct SingleSelection<T> {
    selected: Option<(ItemId, T)>,
    deselect_allowed: bool,

    /// Emitted once per effective change.
    pub selection_changed: Signal<SingleSelectionEvent<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleSelection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleSelection<T> {
    /// Create an empty selection that allows deselection.
    pub fn new() -> Self {
        Self {
            selected: None,
            deselect_allowed: true,
            selection_changed: Signal::new(),
        }
    }

    /// The selected item.
    pub fn selected_item(&self) -> Option<T> {
        self.selected.as_ref().map(|(_, item)| item.clone())
    }

    /// Identity of the selected item.
    pub fn selected_id(&self) -> Option<&ItemId> {
        self.selected.as_ref().map(|(id, _)| id)
    }

    /// Whether the item with `id` is selected.
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selected_id() == Some(id)
    }

    /// Whether the client may deselect the selected item.
    pub fn is_deselect_allowed(&self) -> bool {
        self.deselect_allowed
    }

    /// Allow or forbid deselection from the client.
    pub fn set_deselect_allowed(&mut self, allowed: bool) {
        self.deselect_allowed = allowed;
    }

    /// Select `item`. Returns whether the selection changed.
    pub fn select(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> bool {
        self.set_selected(ctx, Some(item), false)
    }

    /// Deselect `item` if it is the selected one.
    pub fn deselect(&mut self, ctx: &mut SelectionContext<'_, T>, item: &T) -> bool {
        if !self.is_selected(&ctx.data.id_of(item)) {
            return false;
        }
        self.set_selected(ctx, None, false)
    }

    /// Clear the selection.
    pub fn clear(&mut self, ctx: &mut SelectionContext<'_, T>, user_originated: bool) -> bool {
        self.set_selected(ctx, None, user_originated)
    }

    pub(crate) fn select_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> bool {
        self.set_selected(ctx, Some(item), true)
    }

    pub(crate) fn deselect_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: &T) -> bool {
        if !self.deselect_allowed {
            tracing::debug!(target: targets::SELECTION, "client deselect ignored: deselection not allowed");
            return false;
        }
        if !self.is_selected(&ctx.data.id_of(item)) {
            return false;
        }
        self.set_selected(ctx, None, true)
    }

    fn set_selected(&mut self, ctx: &mut SelectionContext<'_, T>, item: Option<T>, user_originated: bool) -> bool {
        let data = ctx.data;
        let next = item.map(|item| (data.id_of(&item), item));
        if next.as_ref().map(|(id, _)| id) == self.selected_id() {
            return false;
        }

        let old = std::mem::replace(&mut self.selected, next);
        let old_value = old.map(|(_, item)| item);
        let new_value = self.selected_item();
        tracing::debug!(
            target: targets::SELECTION,
            selected = ?self.selected_id(),
            user_originated,
            "single selection changed"
        );

        if !user_originated {
            for item in old_value.iter().chain(new_value.iter()) {
                if data.is_active(item) {
                    let item = item.clone();
                    ctx.updates.post("refresh_item", move |client| client.refresh_item(&item));
                }
            }
        }

        self.selection_changed.emit(SingleSelectionEvent {
            old_value,
            new_value,
            user_originated,
        });
        true
    }
}

impl<T> std::fmt::Debug for SingleSelection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleSelection")
            .field("selected", &self.selected.as_ref().map(|(id, _)| id))
            .field("deselect_allowed", &self.deselect_allowed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use horizon_grid_core::DeferredQueue;
    use parking_lot::Mutex;

    use super::*;
    use crate::client::{ClientSync, ClientUpdate};
    use crate::data::ListDataView;

    fn setup() -> (ListDataView<u64>, DeferredQueue<dyn ClientSync<u64>>, SingleSelection<u64>) {
        (
            ListDataView::new(vec![1, 2, 3], |n| ItemId::from(*n)),
            DeferredQueue::new(),
            SingleSelection::new(),
        )
    }

    #[test]
    fn test_select_same_item_is_a_no_op() {
        let (view, mut updates, mut model) = setup();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        model.selection_changed.connect(move |e: &SingleSelectionEvent<u64>| {
            sink.lock().push((e.old_value, e.new_value, e.user_originated));
        });
        let mut ctx = SelectionContext {
            data: &view,
            updates: &mut updates,
        };

        assert!(model.select(&mut ctx, 1));
        assert!(!model.select(&mut ctx, 1));
        assert!(model.select_from_client(&mut ctx, 2));

        assert_eq!(
            *events.lock(),
            vec![(None, Some(1), false), (Some(1), Some(2), true)]
        );
    }

    #[test]
    fn test_deselect_only_affects_selected_item() {
        let (view, mut updates, mut model) = setup();
        let mut ctx = SelectionContext {
            data: &view,
            updates: &mut updates,
        };
        model.select(&mut ctx, 1);

        assert!(!model.deselect(&mut ctx, &2));
        assert_eq!(model.selected_item(), Some(1));
        assert!(model.deselect(&mut ctx, &1));
        assert_eq!(model.selected_item(), None);
    }

    #[test]
    fn test_client_deselect_respects_deselect_allowed() {
        let (view, mut updates, mut model) = setup();
        model.set_deselect_allowed(false);
        let mut ctx = SelectionContext {
            data: &view,
            updates: &mut updates,
        };
        model.select(&mut ctx, 3);

        assert!(!model.deselect_from_client(&mut ctx, &3));
        assert_eq!(model.selected_item(), Some(3));
        assert!(model.deselect(&mut ctx, &3));
    }

    #[test]
    fn test_programmatic_change_refreshes_active_items() {
        let (view, mut updates, mut model) = setup();
        view.set_active_range(Some(0..1));
        {
            let mut ctx = SelectionContext {
                data: &view,
                updates: &mut updates,
            };
            model.select(&mut ctx, 1);
            model.select(&mut ctx, 2);
            model.select_from_client(&mut ctx, 3);
        }

        let mut sent: Vec<ClientUpdate<u64>> = Vec::new();
        updates.flush(&mut sent);
        // Item 2 is outside the active range; the client change sends nothing.
        assert_eq!(sent, vec![ClientUpdate::Refresh(1), ClientUpdate::Refresh(1)]);
    }
}
