//! Selection through the grid: programmatic calls, client messages and the
//! updates queued for the client.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{flush, grid_with_mode, people, person, Person};
use horizon_grid::selection::{MultiSelectionEvent, SingleSelectionEvent};
use horizon_grid::{
    ClientUpdate, ErrorKind, Grid, GridConfig, GridError, ItemId, SelectAllState, SelectionMode,
    TreeDataView,
};

fn count_multi_events(grid: &Grid<Person>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = count.clone();
    grid.selection()
        .as_multi()
        .unwrap()
        .selection_changed
        .connect(move |_: &MultiSelectionEvent<Person>| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
    count
}

#[test]
fn test_repeated_select_fires_once() {
    let mut grid = grid_with_mode(SelectionMode::Multi, people(3));
    let events = count_multi_events(&grid);

    grid.select(person(1));
    grid.select(person(1));

    assert_eq!(grid.selected_items(), vec![person(1)]);
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[test]
fn test_select_all_tri_state() {
    let mut grid = grid_with_mode(SelectionMode::Multi, people(3));

    assert!(grid.select_all());
    assert_eq!(
        grid.select_all_state(),
        Some(SelectAllState {
            checked: true,
            indeterminate: false
        })
    );

    grid.deselect_all();
    assert_eq!(grid.select_all_state(), Some(SelectAllState::default()));

    grid.select(person(2));
    assert_eq!(
        grid.select_all_state(),
        Some(SelectAllState {
            checked: false,
            indeterminate: true
        })
    );
}

#[test]
fn test_wire_updates_only_for_materialized_items() {
    let view = people(4);
    view.set_active_range(Some(0..2));
    let mut grid = grid_with_mode(SelectionMode::Multi, view);

    grid.select_all();
    assert_eq!(
        flush(&mut grid),
        vec![
            ClientUpdate::Select(vec![person(1), person(2)]),
            ClientUpdate::SelectAllState(SelectAllState {
                checked: true,
                indeterminate: false
            }),
        ]
    );

    // The client already shows its own change; only the checkbox follows.
    grid.deselect_item("3").unwrap();
    assert_eq!(
        flush(&mut grid),
        vec![ClientUpdate::SelectAllState(SelectAllState {
            checked: false,
            indeterminate: true
        })]
    );
    assert_eq!(grid.selected_items().len(), 3);
}

#[test]
fn test_hierarchical_select_all_walks_every_level() {
    let view = TreeDataView::new(|s: &&'static str| ItemId::from(*s));
    view.add_root("docs");
    view.add_root("src");
    view.add_child(&"docs".into(), "guide");
    view.add_child(&"guide".into(), "intro");
    view.add_child(&"src".into(), "lib");
    let mut grid = Grid::with_config(
        Arc::new(view),
        GridConfig {
            selection_mode: SelectionMode::Multi,
            ..GridConfig::default()
        },
    );

    grid.select_all_from_client().unwrap();

    assert_eq!(
        grid.selected_items(),
        vec!["docs", "guide", "intro", "src", "lib"]
    );
    assert_eq!(
        grid.select_all_state(),
        Some(SelectAllState {
            checked: false,
            indeterminate: true
        })
    );
}

#[test]
fn test_disabled_selection_rejects_client_changes() {
    let mut grid = grid_with_mode(SelectionMode::None, people(3));

    let err = grid.select_item("1").unwrap_err();
    assert!(matches!(err, GridError::SelectionDisabled));
    assert!(err.is_protocol_violation());
    assert!(grid.select_all_from_client().unwrap_err().is_protocol_violation());
    assert!(grid.deselect_item("2").is_err());

    grid.select(person(1));
    assert!(grid.selected_items().is_empty());
    assert_eq!(grid.pending_client_updates(), 0);
}

#[test]
fn test_stale_key_is_dropped_silently() {
    for mode in [SelectionMode::None, SelectionMode::Single, SelectionMode::Multi] {
        let mut grid = grid_with_mode(mode, people(3));
        grid.select(person(1));
        flush(&mut grid);
        let before = grid.selected_items();

        let events = Arc::new(AtomicUsize::new(0));
        if let Some(multi) = grid.selection().as_multi() {
            let sink = events.clone();
            multi.selection_changed.connect(move |_: &MultiSelectionEvent<Person>| {
                sink.fetch_add(1, Ordering::SeqCst);
            });
        }
        if let Some(single) = grid.selection().as_single() {
            let sink = events.clone();
            single.selection_changed.connect(move |_: &SingleSelectionEvent<Person>| {
                sink.fetch_add(1, Ordering::SeqCst);
            });
        }

        grid.deselect_item("unknown-key").unwrap();
        grid.select_item("unknown-key").unwrap();

        assert_eq!(grid.selected_items(), before, "{mode:?}");
        assert_eq!(events.load(Ordering::SeqCst), 0, "{mode:?}");
        assert_eq!(grid.pending_client_updates(), 0, "{mode:?}");
    }
}

#[test]
fn test_single_selection_refreshes_on_programmatic_change() {
    let mut grid = grid_with_mode(SelectionMode::Single, people(3));
    let origins = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = origins.clone();
    grid.selection()
        .as_single()
        .unwrap()
        .selection_changed
        .connect(move |e: &SingleSelectionEvent<Person>| sink.lock().push(e.user_originated));

    grid.select_item("2").unwrap();
    assert_eq!(grid.pending_client_updates(), 0);

    grid.select(person(3));
    assert_eq!(
        flush(&mut grid),
        vec![ClientUpdate::Refresh(person(2)), ClientUpdate::Refresh(person(3))]
    );
    assert_eq!(*origins.lock(), vec![true, false]);
}

#[test]
fn test_single_selection_client_restrictions() {
    let mut grid = Grid::with_config(
        people(3),
        GridConfig {
            deselect_allowed: false,
            ..GridConfig::default()
        },
    );
    grid.select_item("1").unwrap();
    grid.deselect_item("1").unwrap();
    assert_eq!(grid.selected_items(), vec![person(1)]);

    let err = grid.select_all_from_client().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);

    grid.deselect(person(1));
    assert!(grid.selected_items().is_empty());
}

#[test]
fn test_refresh_preserves_existing_items() {
    let view = people(3);
    let config = GridConfig::from_toml_str(
        r#"
        selection_mode = "multi"
        selection_preservation = "preserve_existing"
        "#,
    )
    .unwrap();
    let mut grid = Grid::with_config(view.clone(), config);
    grid.select(person(1));
    grid.select(person(3));
    flush(&mut grid);

    view.remove(&ItemId::from(3u64));
    grid.data_refreshed();

    assert_eq!(grid.selected_items(), vec![person(1)]);
    assert!(flush(&mut grid).contains(&ClientUpdate::Deselect(vec![person(3)])));
}

#[test]
fn test_mode_switch_and_data_swap_clear_selection() {
    let mut grid = grid_with_mode(SelectionMode::Multi, people(3));
    grid.select(person(1));
    grid.set_selection_mode(SelectionMode::Single);
    assert_eq!(grid.selection().mode(), SelectionMode::Single);
    assert!(grid.selected_items().is_empty());

    grid.select(person(2));
    grid.set_data_view(people(5));
    assert!(grid.selected_items().is_empty());
}

#[test]
fn test_checkbox_follows_growing_data() {
    let view = people(3);
    let mut grid = grid_with_mode(SelectionMode::Multi, view.clone());
    grid.select_all();
    assert!(flush(&mut grid).contains(&ClientUpdate::SelectAllState(SelectAllState {
        checked: true,
        indeterminate: false
    })));

    view.push(person(4));
    grid.data_refreshed();

    let partial = SelectAllState {
        checked: false,
        indeterminate: true,
    };
    assert_eq!(grid.select_all_state(), Some(partial));
    assert_eq!(flush(&mut grid), vec![ClientUpdate::SelectAllState(partial)]);
}

#[test]
fn test_data_swap_resets_checkbox() {
    let mut grid = grid_with_mode(SelectionMode::Multi, people(2));
    grid.select_all();
    flush(&mut grid);

    grid.set_data_view(people(5));
    assert_eq!(
        flush(&mut grid),
        vec![
            ClientUpdate::Deselect(vec![person(1), person(2)]),
            ClientUpdate::SelectAllState(SelectAllState::default()),
        ]
    );
    assert_eq!(grid.select_all_state(), Some(SelectAllState::default()));
}
