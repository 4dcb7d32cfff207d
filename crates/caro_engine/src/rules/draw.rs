//! Draw detection.

use super::win::check_win;
use crate::board::{Board, Coord, Side};
use tracing::instrument;

/// Checks whether the move `side` just made at `last` ended the round in a
/// draw: the board is full and that move did not win.
#[instrument(skip(board))]
pub fn is_draw(board: &Board, last: Coord, side: Side, win_length: usize) -> bool {
    board.is_full() && !check_win(board, last.row, last.col, side, win_length)
}
