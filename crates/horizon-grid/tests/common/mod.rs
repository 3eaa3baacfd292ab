//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use horizon_grid::{
    CellId, ClientUpdate, Column, ColumnId, Grid, GridConfig, ItemId, ListDataView, RowId,
    SelectionMode,
};

/// Item type used by the grid tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

pub fn person(id: u64) -> Person {
    Person {
        id,
        name: format!("person-{id}"),
    }
}

/// Install a test subscriber; `RUST_LOG=horizon_grid=debug` shows grid logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory view of `count` people with ids `1..=count`.
pub fn people(count: u64) -> Arc<ListDataView<Person>> {
    Arc::new(ListDataView::new((1..=count).map(person).collect(), |p: &Person| {
        ItemId::from(p.id)
    }))
}

pub fn grid_with_mode(mode: SelectionMode, view: Arc<ListDataView<Person>>) -> Grid<Person> {
    init_tracing();
    Grid::with_config(
        view,
        GridConfig {
            selection_mode: mode,
            ..GridConfig::default()
        },
    )
}

/// A grid with one keyed column per entry of `keys`.
pub fn grid_with_columns(keys: &[&str]) -> (Grid<Person>, Vec<ColumnId>) {
    init_tracing();
    let mut grid = Grid::new(people(3));
    let ids = keys
        .iter()
        .map(|&key| {
            grid.add_column(Column::new().with_key(key).with_sort_key(|p: &Person| p.name.clone()))
                .unwrap()
        })
        .collect();
    (grid, ids)
}

/// Cell ids of a row, left to right.
pub fn cell_ids(grid: &Grid<Person>, row: RowId) -> Vec<CellId> {
    grid.layers()
        .row(row)
        .unwrap()
        .cells()
        .iter()
        .map(|cell| cell.id())
        .collect()
}

/// Run the queued client updates into a recording client.
pub fn flush(grid: &mut Grid<Person>) -> Vec<ClientUpdate<Person>> {
    let mut sent: Vec<ClientUpdate<Person>> = Vec::new();
    grid.flush_client_updates(&mut sent);
    sent
}
