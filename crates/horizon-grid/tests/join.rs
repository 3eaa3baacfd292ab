//! Joining header and footer cells.

mod common;

use common::{cell_ids, grid_with_columns};
use horizon_grid::{ErrorKind, GridError, RowKind};

#[test]
fn test_joined_columns_share_one_cell() {
    let (mut grid, cols) = grid_with_columns(&["a", "b", "c"]);
    let header = grid.append_header_row();
    grid.cell_mut(header, cols[0]).unwrap().set_text("A");
    grid.cell_mut(header, cols[1]).unwrap().set_text("B");

    let cells = cell_ids(&grid, header);
    let merged = grid.join(header, &cells[..2]).unwrap();

    assert_eq!(grid.cell(header, cols[0]).unwrap().id(), merged);
    assert_eq!(grid.cell(header, cols[1]).unwrap().id(), merged);
    assert_ne!(grid.cell(header, cols[2]).unwrap().id(), merged);
    assert_eq!(grid.cell(header, cols[0]).unwrap().text(), Some("A"));
    assert_eq!(
        grid.layers().cell_columns(header, merged).unwrap(),
        vec![cols[0], cols[1]]
    );

    // Layer 0 cannot hold a group, so the row moved out to a new layer.
    assert_eq!(grid.layers().locate_row(header), Some((1, RowKind::Header)));
    assert_eq!(grid.column_order(), cols);
    grid.validate().unwrap();
}

#[test]
fn test_join_in_place_on_outer_row() {
    let (mut grid, cols) = grid_with_columns(&["a", "b", "c", "d"]);
    let inner = grid.append_header_row();
    let outer = grid.prepend_header_row();

    let cells = cell_ids(&grid, outer);
    let first = grid.join(outer, &cells[..2]).unwrap();
    assert_eq!(grid.layers().layer_count(), 2);
    assert_eq!(cell_ids(&grid, outer).len(), 3);
    assert_eq!(cell_ids(&grid, inner).len(), 4);

    let third = grid.cell(outer, cols[2]).unwrap().id();
    let second = grid.join(outer, &[first, third]).unwrap();
    assert_eq!(
        grid.layers().cell_columns(outer, second).unwrap(),
        vec![cols[0], cols[1], cols[2]]
    );
    assert_eq!(cell_ids(&grid, outer).len(), 2);
    grid.validate().unwrap();
}

#[test]
fn test_join_footer_next_to_header() {
    let (mut grid, cols) = grid_with_columns(&["a", "b", "c"]);
    let header = grid.append_header_row();
    let footer = grid.append_footer_row();

    let cells = cell_ids(&grid, footer);
    let merged = grid.join(footer, &cells[1..]).unwrap();

    assert_eq!(grid.layers().locate_row(header), Some((0, RowKind::Header)));
    assert_eq!(grid.layers().locate_row(footer), Some((1, RowKind::Footer)));
    assert_eq!(cell_ids(&grid, header).len(), 3);
    assert_eq!(grid.cell(footer, cols[2]).unwrap().id(), merged);
    grid.validate().unwrap();
}

#[test]
fn test_join_preconditions() {
    let (mut grid, cols) = grid_with_columns(&["a", "b", "c"]);
    let inner = grid.append_header_row();
    let outer = grid.prepend_header_row();
    let inner_cells = cell_ids(&grid, inner);
    let outer_cells = cell_ids(&grid, outer);

    let errors = [
        grid.join(inner, &inner_cells[..2]).unwrap_err(),
        grid.join(outer, &outer_cells[..1]).unwrap_err(),
        grid.join(outer, &[outer_cells[0], outer_cells[2]]).unwrap_err(),
        grid.join(outer, &[outer_cells[0], inner_cells[1]]).unwrap_err(),
    ];
    assert!(matches!(errors[0], GridError::JoinNotOutermost(_)));
    assert!(matches!(errors[1], GridError::JoinTooFewCells(1)));
    assert!(matches!(errors[2], GridError::JoinNotAdjacent));
    assert!(matches!(errors[3], GridError::CellNotFound { .. }));
    assert!(errors.iter().all(|e| e.kind() == ErrorKind::Usage));

    assert_eq!(cell_ids(&grid, outer), outer_cells);
    assert_eq!(grid.cell(inner, cols[0]).unwrap().id(), inner_cells[0]);
    grid.validate().unwrap();
}

#[test]
fn test_partially_overlapping_join_is_rejected() {
    let (mut grid, _) = grid_with_columns(&["a", "b", "c"]);
    grid.append_header_row();
    let footer = grid.append_footer_row();
    let top = grid.prepend_header_row();
    let top_cells = cell_ids(&grid, top);
    grid.join(top, &top_cells[..2]).unwrap();

    let footer_cells = cell_ids(&grid, footer);
    let err = grid.join(footer, &footer_cells[1..]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Structure);
    assert!(err.to_string().contains("Current column hierarchy"));
    assert_eq!(cell_ids(&grid, footer), footer_cells);
    assert_eq!(grid.layers().layer_count(), 2);
    grid.validate().unwrap();
}
