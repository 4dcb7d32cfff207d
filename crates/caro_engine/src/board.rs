//! Core domain types for the five-in-a-row board.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Default board edge length.
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// A participant seat in the session.
///
/// `Remote` covers both a networked peer and the automated opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The participant driving this engine instance.
    Local,
    /// The opponent, remote or automated.
    Remote,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

/// Symbol a side places on the board for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Mark {
    /// First-mover mark.
    #[display("X")]
    X,
    /// Second-mover mark.
    #[display("O")]
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// State of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here yet.
    Empty,
    /// Claimed by a side for the rest of the round.
    Taken(Side),
}

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, derive_new::new)]
#[display("({row}, {col})")]
pub struct Coord {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

/// Reasons a placement is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Coordinates fall outside the grid.
    #[display("({row}, {col}) is outside a {size}x{size} board")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Board edge length.
        size: usize,
    },
    /// The cell already holds a mark.
    #[display("({row}, {col}) is already taken")]
    Occupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}

/// Square N×N grid of cells.
///
/// Cells only ever move from `Empty` to `Taken`; a fresh board is the
/// only way back to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    filled: usize,
}

impl Board {
    /// Creates an empty board with the given edge length.
    #[instrument]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
            filled: 0,
        }
    }

    /// Edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of taken cells.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Returns true if the coordinates are on the board.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Gets the cell at the given coordinates, or `None` when off the board.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if self.contains(row, col) {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Checks if a cell is on the board and empty.
    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        matches!(self.get(row, col), Some(Cell::Empty))
    }

    /// Marks a cell for `side`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::OutOfBounds` for coordinates off the grid and
    /// `BoardError::Occupied` when the cell is already taken. The board is
    /// untouched on error.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn place(&mut self, row: usize, col: usize, side: Side) -> Result<(), BoardError> {
        match self.get(row, col) {
            None => Err(BoardError::OutOfBounds {
                row,
                col,
                size: self.size,
            }),
            Some(Cell::Taken(_)) => Err(BoardError::Occupied { row, col }),
            Some(Cell::Empty) => {
                self.cells[row * self.size + col] = Cell::Taken(side);
                self.filled += 1;
                Ok(())
            }
        }
    }

    /// Returns true when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.filled == self.cells.len()
    }

    /// Empty cells in row-major scan order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(idx, _)| Coord::new(idx / self.size, idx % self.size))
    }

    /// Formats the board as text, rendering each side with its mark.
    pub fn display(&self, local: Mark) -> String {
        let mut result = String::from("   ");
        for col in 0..self.size {
            result.push_str(&format!("{:>3}", col));
        }
        result.push('\n');
        for row in 0..self.size {
            result.push_str(&format!("{:>3}", row));
            for col in 0..self.size {
                let symbol = match self.cells[row * self.size + col] {
                    Cell::Empty => ".".to_string(),
                    Cell::Taken(Side::Local) => local.to_string(),
                    Cell::Taken(Side::Remote) => local.other().to_string(),
                };
                result.push_str(&format!("{:>3}", symbol));
            }
            result.push('\n');
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::default();
        assert_eq!(board.size(), 15);
        assert_eq!(board.get(7, 7), Some(Cell::Empty));
        assert!(!board.is_full());
        assert_eq!(board.empty_cells().count(), 225);
    }

    #[test]
    fn test_place_marks_cell() {
        let mut board = Board::new(15);
        board.place(3, 4, Side::Local).unwrap();
        assert_eq!(board.get(3, 4), Some(Cell::Taken(Side::Local)));
        assert_eq!(board.filled(), 1);
    }

    #[test]
    fn test_place_on_occupied_cell_fails() {
        let mut board = Board::new(15);
        board.place(0, 0, Side::Local).unwrap();
        let err = board.place(0, 0, Side::Remote).unwrap_err();
        assert_eq!(err, BoardError::Occupied { row: 0, col: 0 });
        assert_eq!(board.get(0, 0), Some(Cell::Taken(Side::Local)));
        assert_eq!(board.filled(), 1);
    }

    #[test]
    fn test_place_out_of_bounds_fails() {
        let mut board = Board::new(15);
        assert!(matches!(
            board.place(15, 0, Side::Local),
            Err(BoardError::OutOfBounds { .. })
        ));
        assert_eq!(board.get(15, 0), None);
        assert_eq!(board.filled(), 0);
    }

    #[test]
    fn test_full_board() {
        let mut board = Board::new(2);
        for (row, col) in [(0, 0), (0, 1), (1, 0)] {
            board.place(row, col, Side::Local).unwrap();
            assert!(!board.is_full());
        }
        board.place(1, 1, Side::Remote).unwrap();
        assert!(board.is_full());
        assert_eq!(board.empty_cells().count(), 0);
    }

    #[test]
    fn test_empty_cells_scan_order() {
        let mut board = Board::new(2);
        board.place(0, 0, Side::Local).unwrap();
        let cells: Vec<_> = board.empty_cells().collect();
        assert_eq!(cells, vec![Coord::new(0, 1), Coord::new(1, 0), Coord::new(1, 1)]);
    }

    #[test]
    fn test_display_uses_marks() {
        let mut board = Board::new(3);
        board.place(0, 0, Side::Local).unwrap();
        board.place(1, 1, Side::Remote).unwrap();
        let text = board.display(Mark::O);
        assert!(text.contains("  O  .  ."));
        assert!(text.contains("  .  X  ."));
    }
}
