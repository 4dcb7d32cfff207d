//! Automated opponent.
//!
//! A greedy one-ply player: take a win if one exists, otherwise block the
//! opponent's immediate win, otherwise play the best cell by a static
//! pattern score. Ties break on row-major scan order so play is
//! reproducible.

use crate::board::{Board, Cell, Coord, Side};
use crate::rules::{AXES, line_through};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Score awarded to a cell that completes a winning run.
const WINNING_SHAPE: u64 = 1_000_000;

/// Trait for automated players the session can drive synchronously.
pub trait Opponent: Send + Debug {
    /// Picks the cell to play for `own`, or `None` when the board is full.
    fn select_move(&mut self, board: &Board, own: Side, opponent: Side) -> Option<Coord>;

    /// Decides whether to accept a draw offered by `own`'s opponent.
    fn accepts_draw(&self, board: &Board, own: Side) -> bool;
}

/// Pattern-scoring opponent for five-in-a-row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct HeuristicOpponent {
    win_length: usize,
}

impl HeuristicOpponent {
    /// Returns the first empty cell (scan order) where `side` would
    /// complete a winning run.
    #[instrument(skip(self, board))]
    pub fn winning_cell(&self, board: &Board, side: Side) -> Option<Coord> {
        board.empty_cells().find(|cell| self.completes_run(board, *cell, side))
    }

    fn completes_run(&self, board: &Board, cell: Coord, side: Side) -> bool {
        AXES.iter()
            .any(|&axis| line_through(board, cell.row, cell.col, axis, side) >= self.win_length)
    }

    /// Run length and number of open ends for `side` through `cell` along one axis.
    fn shape(board: &Board, cell: Coord, axis: (isize, isize), side: Side) -> (usize, usize) {
        let run = line_through(board, cell.row, cell.col, axis, side);
        let open = [1isize, -1]
            .iter()
            .filter(|&&sign| {
                let (dr, dc) = (axis.0 * sign, axis.1 * sign);
                let mut r = cell.row as isize + dr;
                let mut c = cell.col as isize + dc;
                while r >= 0 && c >= 0 && board.get(r as usize, c as usize) == Some(Cell::Taken(side)) {
                    r += dr;
                    c += dc;
                }
                r >= 0 && c >= 0 && board.is_empty_at(r as usize, c as usize)
            })
            .count();
        (run, open)
    }

    fn shape_value(&self, run: usize, open: usize) -> u64 {
        if run >= self.win_length {
            return WINNING_SHAPE;
        }
        if open == 0 {
            return 0;
        }
        // Non-winning shapes stay strictly below a win however long the run.
        let base = 10u64.saturating_pow(run as u32);
        let value = if open == 2 { base.saturating_mul(4) } else { base };
        value.min(WINNING_SHAPE - 1)
    }

    fn side_value(&self, board: &Board, cell: Coord, side: Side) -> u64 {
        AXES.iter()
            .map(|&axis| {
                let (run, open) = Self::shape(board, cell, axis, side);
                self.shape_value(run, open)
            })
            .fold(0u64, u64::saturating_add)
    }

    /// Static score of playing `cell` for `own`.
    ///
    /// Attack outweighs defence slightly; cells nearer the centre get a
    /// small bonus.
    pub fn score(&self, board: &Board, cell: Coord, own: Side, opponent: Side) -> u64 {
        let attack = self.side_value(board, cell, own);
        let defence = self.side_value(board, cell, opponent);
        let centre = board.size() / 2;
        let distance = cell.row.abs_diff(centre) + cell.col.abs_diff(centre);
        let centrality = (2 * centre).saturating_sub(distance) as u64;
        attack
            .saturating_mul(10)
            .saturating_add(defence.saturating_mul(9))
            .saturating_add(centrality)
    }

    fn best_of(&self, board: &Board, cells: impl Iterator<Item = Coord>, own: Side, opponent: Side) -> Option<Coord> {
        let mut best: Option<(Coord, u64)> = None;
        for cell in cells {
            let score = self.score(board, cell, own, opponent);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((cell, score)),
            }
        }
        best.map(|(cell, _)| cell)
    }
}

impl Opponent for HeuristicOpponent {
    #[instrument(skip(self, board), fields(filled = board.filled()))]
    fn select_move(&mut self, board: &Board, own: Side, opponent: Side) -> Option<Coord> {
        if let Some(cell) = self.winning_cell(board, own) {
            debug!(%cell, "Taking winning cell");
            return Some(cell);
        }

        let threats: Vec<Coord> = board
            .empty_cells()
            .filter(|cell| self.completes_run(board, *cell, opponent))
            .collect();
        if !threats.is_empty() {
            let cell = self.best_of(board, threats.into_iter(), own, opponent);
            debug!(cell = ?cell, "Blocking opponent win");
            return cell;
        }

        let cell = self.best_of(board, board.empty_cells(), own, opponent);
        debug!(cell = ?cell, "Chose highest scoring cell");
        cell
    }

    fn accepts_draw(&self, board: &Board, own: Side) -> bool {
        self.winning_cell(board, own).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> HeuristicOpponent {
        HeuristicOpponent::new(5)
    }

    #[test]
    fn test_opens_in_centre() {
        let board = Board::new(15);
        assert_eq!(bot().select_move(&board, Side::Remote, Side::Local), Some(Coord::new(7, 7)));
    }

    #[test]
    fn test_takes_win_over_block() {
        let mut board = Board::new(15);
        for col in 0..4 {
            board.place(3, col, Side::Remote).unwrap();
            board.place(9, col, Side::Local).unwrap();
        }
        assert_eq!(bot().select_move(&board, Side::Remote, Side::Local), Some(Coord::new(3, 4)));
    }

    #[test]
    fn test_blocks_open_four() {
        let mut board = Board::new(15);
        for col in 5..9 {
            board.place(7, col, Side::Local).unwrap();
        }
        board.place(0, 0, Side::Remote).unwrap();
        let chosen = bot().select_move(&board, Side::Remote, Side::Local).unwrap();
        assert!(chosen == Coord::new(7, 4) || chosen == Coord::new(7, 9));
    }

    #[test]
    fn test_blocks_gap_threat() {
        let mut board = Board::new(15);
        for col in [2, 3, 5, 6] {
            board.place(10, col, Side::Local).unwrap();
        }
        assert_eq!(bot().select_move(&board, Side::Remote, Side::Local), Some(Coord::new(10, 4)));
    }

    #[test]
    fn test_no_move_on_full_board() {
        let mut board = Board::new(2);
        for (r, c) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            board.place(r, c, Side::Local).unwrap();
        }
        assert_eq!(bot().select_move(&board, Side::Remote, Side::Local), None);
    }

    #[test]
    fn test_deterministic_choice() {
        let mut board = Board::new(15);
        board.place(7, 7, Side::Local).unwrap();
        let first = bot().select_move(&board, Side::Remote, Side::Local);
        let second = bot().select_move(&board, Side::Remote, Side::Local);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_extends_own_open_three() {
        let mut board = Board::new(15);
        for col in 6..9 {
            board.place(7, col, Side::Remote).unwrap();
        }
        board.place(0, 0, Side::Local).unwrap();
        board.place(14, 14, Side::Local).unwrap();
        let chosen = bot().select_move(&board, Side::Remote, Side::Local).unwrap();
        assert!(chosen == Coord::new(7, 5) || chosen == Coord::new(7, 9));
    }

    #[test]
    fn test_long_runs_score_without_overflow() {
        let mut bot = HeuristicOpponent::new(20);
        let mut board = Board::new(20);
        for col in 0..17 {
            board.place(10, col, Side::Local).unwrap();
        }
        let chosen = bot.select_move(&board, Side::Remote, Side::Local).unwrap();
        assert!(board.is_empty_at(chosen.row, chosen.col));
        assert!(bot.score(&board, Coord::new(10, 17), Side::Remote, Side::Local) > 0);
    }

    #[test]
    fn test_near_win_never_outranks_win() {
        let bot = HeuristicOpponent::new(20);
        assert!(bot.shape_value(19, 2) < bot.shape_value(20, 0));
        assert!(bot.shape_value(18, 1) < WINNING_SHAPE);
    }

    #[test]
    fn test_declines_draw_when_winning() {
        let mut board = Board::new(15);
        for col in 0..4 {
            board.place(2, col, Side::Remote).unwrap();
        }
        assert!(!bot().accepts_draw(&board, Side::Remote));
        assert!(bot().accepts_draw(&Board::new(15), Side::Remote));
    }
}
