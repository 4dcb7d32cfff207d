//! Rule configuration for a match.

use crate::board::DEFAULT_BOARD_SIZE;
use crate::error::ConfigError;
use crate::rules::DEFAULT_WIN_LENGTH;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Largest accepted board edge; coordinates are shown in three columns.
pub const MAX_BOARD_SIZE: usize = 99;

/// Default seconds allowed per turn.
pub const DEFAULT_TURN_SECONDS: u32 = 30;

/// Board geometry and time limit shared by both sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Board edge length.
    #[serde(default = "default_board_size")]
    board_size: usize,

    /// Marks in a row needed to win.
    #[serde(default = "default_win_length")]
    win_length: usize,

    /// Seconds allowed per turn.
    #[serde(default = "default_turn_seconds")]
    turn_seconds: u32,
}

fn default_board_size() -> usize {
    DEFAULT_BOARD_SIZE
}

fn default_win_length() -> usize {
    DEFAULT_WIN_LENGTH
}

fn default_turn_seconds() -> u32 {
    DEFAULT_TURN_SECONDS
}

impl RulesConfig {
    /// Creates a validated rule set.
    #[instrument]
    pub fn new(board_size: usize, win_length: usize, turn_seconds: u32) -> Result<Self, ConfigError> {
        let rules = Self {
            board_size,
            win_length,
            turn_seconds,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// Checks that the rules describe a playable game.
    #[instrument]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size == 0 || self.board_size > MAX_BOARD_SIZE {
            return Err(ConfigError::new(format!(
                "board_size must be between 1 and {MAX_BOARD_SIZE}, got {}",
                self.board_size
            )));
        }
        if self.win_length == 0 || self.win_length > self.board_size {
            return Err(ConfigError::new(format!(
                "win_length must be between 1 and board_size ({}), got {}",
                self.board_size, self.win_length
            )));
        }
        if self.turn_seconds == 0 {
            return Err(ConfigError::new("turn_seconds must be at least 1"));
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            win_length: DEFAULT_WIN_LENGTH,
            turn_seconds: DEFAULT_TURN_SECONDS,
        }
    }
}
