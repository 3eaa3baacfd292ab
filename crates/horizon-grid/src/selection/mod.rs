//! Selection models.
//!
//! The grid uses one of three models, chosen by [`SelectionMode`]:
//!
//! - [`SingleSelection`]: at most one selected item
//! - [`MultiSelection`]: any number of selected items, with a "select all"
//!   checkbox
//! - none: selection is disabled and client requests are protocol errors
//!
//! Every model distinguishes programmatic calls from client-originated ones.
//! A change is applied only if it changes the selected set; it then fires the
//! model's `selection_changed` signal once and, for programmatic changes,
//! queues wire updates only for items the client has materialized.

mod multi;
mod single;

use horizon_grid_core::logging::targets;
use horizon_grid_core::DeferredQueue;

pub use multi::{MultiSelection, MultiSelectionEvent};
pub use single::{SingleSelection, SingleSelectionEvent};

use crate::client::ClientSync;
use crate::config::{GridConfig, SelectionMode, SelectionPreservation};
use crate::data::{DataView, ItemId};
use crate::error::{GridError, Result};

/// What a selection operation needs from its grid.
pub struct SelectionContext<'a, T> {
    /// The grid's data.
    pub data: &'a dyn DataView<T>,
    /// The grid's outbound update queue.
    pub updates: &'a mut DeferredQueue<dyn ClientSync<T>>,
}

/// Every item of a hierarchical view, depth-first.
///
/// Children are only fetched for items that report having children.
pub(crate) fn fetch_hierarchy<T: Clone>(data: &dyn DataView<T>) -> Vec<T> {
    fn visit<T: Clone>(data: &dyn DataView<T>, item: T, out: &mut Vec<T>) {
        let has_children = data.has_children(&item);
        let children = if has_children {
            data.children(&item)
        } else {
            Vec::new()
        };
        out.push(item);
        for child in children {
            visit(data, child, out);
        }
    }

    let mut out = Vec::new();
    for root in data.roots() {
        visit(data, root, &mut out);
    }
    out
}

/// Every item of the view: all descendants for trees, a flat fetch otherwise.
pub(crate) fn fetch_every_item<T: Clone>(data: &dyn DataView<T>) -> Vec<T> {
    if data.is_hierarchical() {
        fetch_hierarchy(data)
    } else {
        data.fetch_all()
    }
}

/// The grid's active selection model.
pub enum SelectionModel<T> {
    /// Selection is disabled.
    None,
    /// Single selection.
    Single(SingleSelection<T>),
    /// Multi selection.
    Multi(MultiSelection<T>),
}

impl<T: Clone + Send + Sync + 'static> SelectionModel<T> {
    /// Create the model for `config.selection_mode`.
    pub fn from_config(config: &GridConfig) -> Self {
        match config.selection_mode {
            SelectionMode::None => Self::None,
            SelectionMode::Single => {
                let mut model = SingleSelection::new();
                model.set_deselect_allowed(config.deselect_allowed);
                Self::Single(model)
            }
            SelectionMode::Multi => {
                let mut model = MultiSelection::new();
                model.set_select_all_checkbox(config.select_all_checkbox);
                Self::Multi(model)
            }
        }
    }

    /// The model's mode.
    pub fn mode(&self) -> SelectionMode {
        match self {
            Self::None => SelectionMode::None,
            Self::Single(_) => SelectionMode::Single,
            Self::Multi(_) => SelectionMode::Multi,
        }
    }

    /// The single selection model, if active.
    pub fn as_single(&self) -> Option<&SingleSelection<T>> {
        match self {
            Self::Single(model) => Some(model),
            _ => None,
        }
    }

    /// The multi selection model, if active.
    pub fn as_multi(&self) -> Option<&MultiSelection<T>> {
        match self {
            Self::Multi(model) => Some(model),
            _ => None,
        }
    }

    /// Whether the item with `id` is selected.
    pub fn is_selected(&self, id: &ItemId) -> bool {
        match self {
            Self::None => false,
            Self::Single(model) => model.is_selected(id),
            Self::Multi(model) => model.is_selected(id),
        }
    }

    /// Selected items in selection order.
    pub fn selected_items(&self) -> Vec<T> {
        match self {
            Self::None => Vec::new(),
            Self::Single(model) => model.selected_item().into_iter().collect(),
            Self::Multi(model) => model.selected_items(),
        }
    }

    // =========================================================================
    // Programmatic operations
    // =========================================================================

    /// Select an item. Does nothing when selection is disabled.
    pub fn select(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) {
        match self {
            Self::None => {}
            Self::Single(model) => {
                model.select(ctx, item);
            }
            Self::Multi(model) => {
                model.update_selection(ctx, vec![item], Vec::new());
            }
        }
    }

    /// Deselect an item. Does nothing when selection is disabled.
    pub fn deselect(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) {
        match self {
            Self::None => {}
            Self::Single(model) => {
                model.deselect(ctx, &item);
            }
            Self::Multi(model) => {
                model.update_selection(ctx, Vec::new(), vec![item]);
            }
        }
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self, ctx: &mut SelectionContext<'_, T>) {
        match self {
            Self::None => {}
            Self::Single(model) => {
                model.clear(ctx, false);
            }
            Self::Multi(model) => {
                model.deselect_all(ctx);
            }
        }
    }

    /// Push the "select all" checkbox state if the data changed it.
    pub fn sync_select_all_state(&mut self, ctx: &mut SelectionContext<'_, T>) {
        if let Self::Multi(model) = self {
            model.sync_select_all_state(ctx);
        }
    }

    /// Apply a preservation policy after the data was refreshed.
    pub fn data_refreshed(&mut self, ctx: &mut SelectionContext<'_, T>, policy: SelectionPreservation) {
        self.apply_preservation(ctx, policy);
        self.sync_select_all_state(ctx);
    }

    fn apply_preservation(&mut self, ctx: &mut SelectionContext<'_, T>, policy: SelectionPreservation) {
        match policy {
            SelectionPreservation::PreserveAll => {}
            SelectionPreservation::Discard => self.deselect_all(ctx),
            SelectionPreservation::PreserveExisting => {
                let stale: Vec<T> = {
                    let existing: std::collections::HashSet<ItemId> = fetch_every_item(ctx.data)
                        .iter()
                        .map(|item| ctx.data.id_of(item))
                        .collect();
                    self.selected_items()
                        .into_iter()
                        .filter(|item| !existing.contains(&ctx.data.id_of(item)))
                        .collect()
                };
                if stale.is_empty() {
                    return;
                }
                tracing::debug!(target: targets::SELECTION, stale = stale.len(), "dropping items no longer in the data");
                match self {
                    Self::None => {}
                    Self::Single(model) => {
                        model.clear(ctx, false);
                    }
                    Self::Multi(model) => {
                        model.update_selection(ctx, Vec::new(), stale);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Client-originated operations
    // =========================================================================

    fn disabled<R>(operation: &str) -> Result<R> {
        tracing::error!(
            target: targets::SELECTION,
            operation,
            "client changed selection although the selection mode is none"
        );
        Err(GridError::SelectionDisabled)
    }

    /// The client selected an item.
    pub fn select_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> Result<()> {
        match self {
            Self::None => Self::disabled("select"),
            Self::Single(model) => {
                model.select_from_client(ctx, item);
                Ok(())
            }
            Self::Multi(model) => {
                model.select_from_client(ctx, item);
                Ok(())
            }
        }
    }

    /// The client deselected an item.
    pub fn deselect_from_client(&mut self, ctx: &mut SelectionContext<'_, T>, item: T) -> Result<()> {
        match self {
            Self::None => Self::disabled("deselect"),
            Self::Single(model) => {
                model.deselect_from_client(ctx, &item);
                Ok(())
            }
            Self::Multi(model) => {
                model.deselect_from_client(ctx, item);
                Ok(())
            }
        }
    }

    /// The client checked the "select all" checkbox.
    pub fn select_all_from_client(&mut self, ctx: &mut SelectionContext<'_, T>) -> Result<()> {
        match self {
            Self::Multi(model) => {
                model.select_all_from_client(ctx);
                Ok(())
            }
            Self::None => Self::disabled("select all"),
            Self::Single(_) => Err(GridError::invalid(
                "select all is only available with multi selection",
            )),
        }
    }

    /// The client unchecked the "select all" checkbox.
    pub fn deselect_all_from_client(&mut self, ctx: &mut SelectionContext<'_, T>) -> Result<()> {
        match self {
            Self::Multi(model) => {
                model.deselect_all_from_client(ctx);
                Ok(())
            }
            Self::None => Self::disabled("deselect all"),
            Self::Single(_) => Err(GridError::invalid(
                "deselect all is only available with multi selection",
            )),
        }
    }
}

impl<T> std::fmt::Debug for SelectionModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("SelectionModel::None"),
            Self::Single(_) => f.write_str("SelectionModel::Single"),
            Self::Multi(_) => f.write_str("SelectionModel::Multi"),
        }
    }
}
