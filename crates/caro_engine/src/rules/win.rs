//! Win detection along the four axes through a just-played cell.

use crate::board::{Board, Cell, Side};
use tracing::instrument;

/// Default number of marks in a row needed to win.
pub const DEFAULT_WIN_LENGTH: usize = 5;

/// Unit steps for the horizontal, vertical, and both diagonal axes.
pub const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Counts consecutive `side` marks from `(row, col)` stepping by `(dr, dc)`,
/// excluding the starting cell. Stops at the edge or any other cell.
fn count_direction(board: &Board, row: usize, col: usize, dr: isize, dc: isize, side: Side) -> usize {
    let mut count = 0;
    let mut r = row as isize + dr;
    let mut c = col as isize + dc;
    while r >= 0 && c >= 0 {
        match board.get(r as usize, c as usize) {
            Some(Cell::Taken(s)) if s == side => count += 1,
            _ => break,
        }
        r += dr;
        c += dc;
    }
    count
}

/// Length of the `side` run through `(row, col)` along one axis, counting
/// the cell itself as if `side` occupied it.
pub fn line_through(board: &Board, row: usize, col: usize, axis: (isize, isize), side: Side) -> usize {
    let (dr, dc) = axis;
    1 + count_direction(board, row, col, dr, dc, side) + count_direction(board, row, col, -dr, -dc, side)
}

/// Checks whether the mark `side` just placed at `(row, col)` completes a
/// run of at least `win_length`.
///
/// Only runs through the placed cell are considered. Overlines count.
#[instrument(skip(board))]
pub fn check_win(board: &Board, row: usize, col: usize, side: Side, win_length: usize) -> bool {
    if board.get(row, col) != Some(Cell::Taken(side)) {
        return false;
    }
    AXES
        .iter()
        .any(|&axis| line_through(board, row, col, axis, side) >= win_length)
}
