//! Terminal presentation: typed commands in, rendered notifications out.
//!
//! The console holds no game state of its own beyond a display copy of
//! the board rebuilt from `BoardChanged` notifications.

use caro_engine::{Board, Input, LocalAction, Mark, Notification, Outcome, Phase, Side};
use tracing::{debug, warn};

/// Help text printed on request or after an unknown command.
pub const HELP: &str = "\
Commands:
  <row> <col>    place your mark, e.g. `7 7`
  draw           offer a draw
  yes | no       answer a draw offer
  say <text>     chat with your opponent
  next           start the next round (your opponent follows)
  leave          quit the session
  help           show this text";

/// A line typed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the session.
    Session(Input),
    /// Print the command list.
    Help,
    /// Nothing typed.
    Empty,
    /// Not understood.
    Unknown(String),
}

impl ConsoleCommand {
    /// Parses one input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleCommand::Empty;
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "draw" => ConsoleCommand::Session(Input::Local(LocalAction::RequestDraw)),
            "yes" | "y" => ConsoleCommand::Session(Input::Local(LocalAction::RespondToDraw { accepted: true })),
            "no" | "n" => ConsoleCommand::Session(Input::Local(LocalAction::RespondToDraw { accepted: false })),
            "say" | "chat" => ConsoleCommand::Session(Input::Local(LocalAction::Chat(rest.to_string()))),
            "next" => ConsoleCommand::Session(Input::NextRound),
            "leave" | "quit" | "exit" => ConsoleCommand::Session(Input::Local(LocalAction::Leave)),
            "help" | "?" => ConsoleCommand::Help,
            _ => parse_cell(line)
                .map(|(row, col)| ConsoleCommand::Session(Input::Local(LocalAction::Move { row, col })))
                .unwrap_or_else(|| ConsoleCommand::Unknown(line.to_string())),
        }
    }
}

fn parse_cell(line: &str) -> Option<(usize, usize)> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let row = parts.next()?.parse().ok()?;
    let col = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((row, col))
}

/// Turns notifications into lines of text.
#[derive(Debug)]
pub struct Renderer {
    board: Board,
    board_size: usize,
    local_mark: Mark,
}

impl Renderer {
    /// Creates a renderer for boards of `board_size`.
    pub fn new(board_size: usize) -> Self {
        Self {
            board: Board::new(board_size),
            board_size,
            local_mark: Mark::X,
        }
    }

    /// Renders one notification.
    pub fn render(&mut self, notification: Notification) -> Vec<String> {
        debug!(?notification, "Rendering");
        match notification {
            Notification::RoundStarted {
                round,
                local_mark,
                first,
            } => {
                self.board = Board::new(self.board_size);
                self.local_mark = local_mark;
                let opener = match first {
                    Side::Local => "you move first",
                    Side::Remote => "your opponent moves first",
                };
                vec![
                    format!("── Round {} ── you play {}, {}", round + 1, local_mark, opener),
                    self.board.display(self.local_mark),
                ]
            }
            Notification::BoardChanged { row, col, side, mark } => {
                if let Err(e) = self.board.place(row, col, side) {
                    warn!(error = %e, "Display board out of step with session");
                }
                let who = match side {
                    Side::Local => "You",
                    Side::Remote => "Opponent",
                };
                vec![
                    format!("{who} played {mark} at ({row}, {col})"),
                    self.board.display(self.local_mark),
                ]
            }
            Notification::TurnChanged { active: Side::Local } => vec!["Your move.".to_string()],
            Notification::TurnChanged { active: Side::Remote } => vec!["Waiting for opponent...".to_string()],
            Notification::PhaseChanged {
                phase: Phase::DrawRequestedByLocal,
            } => vec!["Draw offered, waiting for an answer.".to_string()],
            Notification::PhaseChanged {
                phase: Phase::InProgress,
            } => vec!["Play continues.".to_string()],
            Notification::PhaseChanged { .. } => Vec::new(),
            Notification::TimerTick { seconds_left } if seconds_left % 10 == 0 || seconds_left <= 5 => {
                vec![format!("{seconds_left}s left")]
            }
            Notification::TimerTick { .. } => Vec::new(),
            Notification::GameEnded { outcome } => vec![
                outcome_line(outcome).to_string(),
                "Type `next` for another round or `leave` to quit.".to_string(),
            ],
            Notification::DrawRequestReceived => vec!["Opponent offers a draw. Answer yes or no.".to_string()],
            Notification::DrawResponseReceived { accepted: true } => vec!["Draw accepted.".to_string()],
            Notification::DrawResponseReceived { accepted: false } => vec!["Draw refused.".to_string()],
            Notification::ChatReceived { text } => vec![format!("opponent: {text}")],
            Notification::OpponentLeft => vec!["Opponent left the game.".to_string()],
            Notification::Rejected { reason } => vec![format!("Not allowed: {reason}")],
            Notification::OutboundFailed { command, reason } => {
                vec![format!("Could not send {command}: {reason}")]
            }
        }
    }
}

fn outcome_line(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::LocalWin => "You win!",
        Outcome::LocalLoss => "You lose.",
        Outcome::Draw => "Draw.",
        Outcome::ForfeitByLocal => "You forfeited the round.",
        Outcome::ForfeitByRemote => "Your opponent forfeited the round.",
    }
}
