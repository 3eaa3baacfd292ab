//! The data side of the grid.
//!
//! The grid never owns its items. It reads them through a [`DataView`], which
//! answers the questions selection and data generation need: how items are
//! identified, how many there are, whether they form a tree, and which of
//! them the client currently has materialized.
//!
//! Two in-memory views are provided: [`ListDataView`] for flat lists and
//! [`TreeDataView`] for hierarchical data.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Stable identity of a data item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// How the items behind a view are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataKind {
    /// All items are held in memory.
    #[default]
    InMemory,
    /// Items are fetched lazily from a backend.
    Lazy,
    /// Items form a tree.
    Hierarchical,
}

/// Read access to the grid's items.
pub trait DataView<T>: Send + Sync {
    /// Storage kind.
    fn kind(&self) -> DataKind;

    /// Identity of an item.
    fn id_of(&self, item: &T) -> ItemId;

    /// Total number of items, `None` when unknown.
    fn size(&self) -> Option<usize>;

    /// All items of a flat view, or the roots of a hierarchical one.
    fn fetch_all(&self) -> Vec<T>;

    /// Top-level items.
    fn roots(&self) -> Vec<T> {
        self.fetch_all()
    }

    /// Direct children of an item; empty for flat views.
    fn children(&self, _item: &T) -> Vec<T> {
        Vec::new()
    }

    /// Whether an item has children.
    fn has_children(&self, item: &T) -> bool {
        !self.children(item).is_empty()
    }

    /// Whether the client currently has the item materialized.
    fn is_active(&self, item: &T) -> bool;

    /// Resolve a client key to an item.
    ///
    /// Keys are the string form of [`ItemId`]s. The default implementation
    /// searches [`DataView::fetch_all`].
    fn item_for_key(&self, key: &str) -> Option<T> {
        self.fetch_all()
            .into_iter()
            .find(|item| self.id_of(item).as_str() == key)
    }

    /// Whether the view is hierarchical.
    fn is_hierarchical(&self) -> bool {
        self.kind() == DataKind::Hierarchical
    }
}

/// Extracts the identity of an item.
pub type IdExtractor<T> = Arc<dyn Fn(&T) -> ItemId + Send + Sync>;

/// A flat, in-memory data view.
///
/// The view can pose as lazily loaded ([`ListDataView::lazy`]), optionally
/// hiding its size, and can limit the client's materialized window with
/// [`ListDataView::set_active_range`].
pub struct ListDataView<T> {
    items: RwLock<Vec<T>>,
    id_extractor: IdExtractor<T>,
    kind: DataKind,
    size_known: bool,
    active: RwLock<Option<Range<usize>>>,
    /// Position of every item by id; rebuilt lazily after removals.
    positions: RwLock<Option<HashMap<ItemId, usize>>>,
}

impl<T: Clone + Send + Sync + 'static> ListDataView<T> {
    /// Create an in-memory view; every item counts as materialized.
    pub fn new<F>(items: Vec<T>, id_extractor: F) -> Self
    where
        F: Fn(&T) -> ItemId + Send + Sync + 'static,
    {
        Self {
            items: RwLock::new(items),
            id_extractor: Arc::new(id_extractor),
            kind: DataKind::InMemory,
            size_known: true,
            active: RwLock::new(None),
            positions: RwLock::new(None),
        }
    }

    /// Create a view that reports itself as lazily loaded.
    ///
    /// With `size_known == false` the size is reported as unknown.
    pub fn lazy<F>(items: Vec<T>, id_extractor: F, size_known: bool) -> Self
    where
        F: Fn(&T) -> ItemId + Send + Sync + 'static,
    {
        Self {
            kind: DataKind::Lazy,
            size_known,
            ..Self::new(items, id_extractor)
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the view has no items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        let mut items = self.items.write();
        if let Some(positions) = self.positions.write().as_mut() {
            positions.entry(self.id_of(&item)).or_insert(items.len());
        }
        items.push(item);
    }

    /// Remove every item with the given id.
    pub fn remove(&self, id: &ItemId) {
        let extractor = &self.id_extractor;
        self.items.write().retain(|item| &extractor(item) != id);
        *self.positions.write() = None;
    }

    /// Replace all items.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        *self.positions.write() = None;
    }

    /// Position of the item with `id`, if present.
    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        if let Some(positions) = self.positions.read().as_ref() {
            return positions.get(id).copied();
        }
        let items = self.items.read();
        let mut positions = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            positions.entry(self.id_of(item)).or_insert(pos);
        }
        let found = positions.get(id).copied();
        *self.positions.write() = Some(positions);
        found
    }

    /// Limit the materialized window to `range` (by position); `None`
    /// materializes everything.
    pub fn set_active_range(&self, range: Option<Range<usize>>) {
        *self.active.write() = range;
    }
}

impl<T: Clone + Send + Sync + 'static> DataView<T> for ListDataView<T> {
    fn kind(&self) -> DataKind {
        self.kind
    }

    fn id_of(&self, item: &T) -> ItemId {
        (self.id_extractor)(item)
    }

    fn size(&self) -> Option<usize> {
        self.size_known.then(|| self.len())
    }

    fn fetch_all(&self) -> Vec<T> {
        self.items.read().clone()
    }

    fn is_active(&self, item: &T) -> bool {
        let Some(range) = self.active.read().clone() else {
            return true;
        };
        self.position_of(&self.id_of(item))
            .is_some_and(|pos| range.contains(&pos))
    }
}

impl<T> fmt::Debug for ListDataView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDataView")
            .field("len", &self.items.read().len())
            .field("kind", &self.kind)
            .field("size_known", &self.size_known)
            .finish_non_exhaustive()
    }
}

/// A hierarchical, in-memory data view.
pub struct TreeDataView<T> {
    roots: RwLock<Vec<T>>,
    children: RwLock<HashMap<ItemId, Vec<T>>>,
    id_extractor: IdExtractor<T>,
    active: RwLock<Option<HashSet<ItemId>>>,
}

impl<T: Clone + Send + Sync + 'static> TreeDataView<T> {
    /// Create an empty tree.
    pub fn new<F>(id_extractor: F) -> Self
    where
        F: Fn(&T) -> ItemId + Send + Sync + 'static,
    {
        Self {
            roots: RwLock::new(Vec::new()),
            children: RwLock::new(HashMap::new()),
            id_extractor: Arc::new(id_extractor),
            active: RwLock::new(None),
        }
    }

    /// Add a top-level item.
    pub fn add_root(&self, item: T) {
        self.roots.write().push(item);
    }

    /// Add a child below the item with id `parent`.
    pub fn add_child(&self, parent: &ItemId, item: T) {
        self.children
            .write()
            .entry(parent.clone())
            .or_default()
            .push(item);
    }

    /// Restrict the materialized items to `ids`; `None` materializes all.
    pub fn set_active(&self, ids: Option<HashSet<ItemId>>) {
        *self.active.write() = ids;
    }

    /// Every item, depth-first.
    pub fn flatten(&self) -> Vec<T> {
        let mut out = Vec::new();
        let mut stack: Vec<T> = self.roots.read().iter().rev().cloned().collect();
        while let Some(item) = stack.pop() {
            let children = self.children(&item);
            out.push(item);
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

impl<T: Clone + Send + Sync + 'static> DataView<T> for TreeDataView<T> {
    fn kind(&self) -> DataKind {
        DataKind::Hierarchical
    }

    fn id_of(&self, item: &T) -> ItemId {
        (self.id_extractor)(item)
    }

    fn size(&self) -> Option<usize> {
        None
    }

    fn fetch_all(&self) -> Vec<T> {
        self.roots.read().clone()
    }

    fn children(&self, item: &T) -> Vec<T> {
        self.children
            .read()
            .get(&self.id_of(item))
            .cloned()
            .unwrap_or_default()
    }

    fn has_children(&self, item: &T) -> bool {
        self.children
            .read()
            .get(&self.id_of(item))
            .is_some_and(|c| !c.is_empty())
    }

    fn is_active(&self, item: &T) -> bool {
        match &*self.active.read() {
            Some(ids) => ids.contains(&self.id_of(item)),
            None => true,
        }
    }

    fn item_for_key(&self, key: &str) -> Option<T> {
        self.flatten()
            .into_iter()
            .find(|item| self.id_of(item).as_str() == key)
    }
}

impl<T> fmt::Debug for TreeDataView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDataView")
            .field("roots", &self.roots.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: u64) -> ListDataView<u64> {
        ListDataView::new((1..=n).collect(), |n| ItemId::from(*n))
    }

    #[test]
    fn test_list_view_basics() {
        let view = numbers(3);
        assert_eq!(view.kind(), DataKind::InMemory);
        assert_eq!(view.size(), Some(3));
        assert_eq!(view.item_for_key("2"), Some(2));
        assert_eq!(view.item_for_key("9"), None);

        view.remove(&ItemId::from(2u64));
        assert_eq!(view.fetch_all(), vec![1, 3]);
    }

    #[test]
    fn test_lazy_view_hides_size() {
        let view = ListDataView::lazy(vec![1u64, 2], |n| ItemId::from(*n), false);
        assert_eq!(view.kind(), DataKind::Lazy);
        assert_eq!(view.size(), None);
    }

    #[test]
    fn test_active_range() {
        let view = numbers(5);
        assert!(view.is_active(&5));
        view.set_active_range(Some(0..2));
        assert!(view.is_active(&2));
        assert!(!view.is_active(&3));
    }

    #[test]
    fn test_active_range_tracks_removals() {
        let view = numbers(4);
        view.set_active_range(Some(0..2));
        assert!(!view.is_active(&3));
        assert_eq!(view.position_of(&ItemId::from(4u64)), Some(3));

        view.remove(&ItemId::from(1u64));
        assert!(view.is_active(&3));
        view.push(5);
        assert_eq!(view.position_of(&ItemId::from(5u64)), Some(3));
        assert_eq!(view.position_of(&ItemId::from(1u64)), None);
    }

    #[test]
    fn test_active_lookup_scales_linearly() {
        let view = numbers(100_000);
        view.set_active_range(Some(0..50));
        let active = view.fetch_all().iter().filter(|n| view.is_active(n)).count();
        assert_eq!(active, 50);
    }

    #[test]
    fn test_tree_view() {
        let view = TreeDataView::new(|s: &String| ItemId::from(s.as_str()));
        view.add_root("a".to_string());
        view.add_root("b".to_string());
        view.add_child(&"a".into(), "a1".to_string());
        view.add_child(&"a1".into(), "a1x".to_string());

        assert!(view.is_hierarchical());
        assert_eq!(view.size(), None);
        assert!(view.has_children(&"a".to_string()));
        assert!(!view.has_children(&"b".to_string()));
        assert_eq!(view.flatten(), vec!["a", "a1", "a1x", "b"]);
        assert_eq!(view.item_for_key("a1x"), Some("a1x".to_string()));
    }
}
