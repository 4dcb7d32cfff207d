//! Error types for the session engine.

use crate::board::{BoardError, Side};
use crate::session::Phase;
use derive_more::{Display, Error};
use tracing::instrument;

/// A rejected session event.
///
/// Every variant is recoverable: the offending event is dropped and the
/// session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// The target cell is taken or off the board.
    #[display("Illegal move at ({row}, {col}): {reason}")]
    IllegalMove {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Why the board refused it.
        reason: BoardError,
    },

    /// The actor tried to act outside its turn or outside an in-progress round.
    #[display("{actor:?} cannot act now (phase {phase:?}, {active:?} to move)")]
    InvalidTurn {
        /// Side that attempted the action.
        actor: Side,
        /// Phase at the time.
        phase: Phase,
        /// Side holding the turn.
        active: Side,
    },

    /// The event makes no sense in the current phase.
    #[display("Cannot {action} while {phase:?}")]
    InvalidPhaseTransition {
        /// What was attempted.
        action: &'static str,
        /// Phase at the time.
        phase: Phase,
    },
}

impl From<BoardError> for SessionError {
    fn from(err: BoardError) -> Self {
        let (row, col) = match err {
            BoardError::OutOfBounds { row, col, .. } | BoardError::Occupied { row, col } => (row, col),
        };
        SessionError::IllegalMove { row, col, reason: err }
    }
}

/// Outbound delivery failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Transport error: {} at {}:{}", message, file, line)]
pub struct TransportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// The session task is gone; inputs can no longer be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Session is no longer running")]
pub struct SessionClosed;
