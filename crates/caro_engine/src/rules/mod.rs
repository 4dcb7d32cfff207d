//! Terminal-condition rules for five-in-a-row.
//!
//! Rules are pure functions over a board and the cell that was just
//! played, kept apart from board storage so the session and the
//! heuristic opponent share one definition of a win.

pub mod draw;
pub mod win;

pub use draw::is_draw;
pub use win::{AXES, DEFAULT_WIN_LENGTH, check_win, line_through};
