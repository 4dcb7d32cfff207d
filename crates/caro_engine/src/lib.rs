//! Caro engine - game session engine for networked five-in-a-row
//!
//! Two participants, or one participant and a bot, play on an N×N board;
//! the first to line up five marks wins. The engine is the authoritative
//! state machine behind a match: it enforces turn order and move
//! legality, detects wins and draws, runs the automated opponent, keeps a
//! single-flight turn timer, and negotiates draws.
//!
//! # Architecture
//!
//! - **Board**: grid of cells that only ever fill up within a round
//! - **Rules**: win detection through the last-played cell, draw detection
//! - **Opponent**: greedy pattern-scoring bot
//! - **Timer**: generation-stamped countdown that drops stale signals
//! - **Session**: phase/turn state machine emitting notifications and wire messages
//! - **Runtime**: tokio task serializing every input into one session
//!
//! # Example
//!
//! ```no_run
//! use caro_engine::{Adversary, HeuristicOpponent, Notification, RulesConfig, spawn_session};
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<Notification>();
//! let bot = HeuristicOpponent::new(5);
//! let (handle, _task) = spawn_session(
//!     RulesConfig::default(),
//!     Adversary::Automated(Box::new(bot)),
//!     Box::new(notify_tx),
//! );
//! handle.start_round(0).ok();
//! handle.request_move(7, 7).ok();
//! while let Some(notification) = notify_rx.recv().await {
//!     println!("{notification:?}");
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod config;
mod error;
mod events;
mod opponent;
mod protocol;
mod rules;
mod runtime;
mod session;
mod timer;

// Crate-level exports - Board
pub use board::{Board, BoardError, Cell, Coord, DEFAULT_BOARD_SIZE, Mark, Side};

// Crate-level exports - Rules
pub use rules::{AXES, DEFAULT_WIN_LENGTH, check_win, is_draw, line_through};

// Crate-level exports - Opponent
pub use opponent::{HeuristicOpponent, Opponent};

// Crate-level exports - Timer
pub use timer::{Generation, TimerDriver, TimerSignal, TimerSignalKind, TokioTimerDriver, TurnTimer};

// Crate-level exports - Session
pub use session::{AUTOMATED_CHAT_REPLY, Adversary, Outcome, Phase, Seating, Session};

// Crate-level exports - Presentation and transport boundaries
pub use events::{Notification, Presenter};
pub use protocol::{Command, Message, Outbound, ProtocolError, SEPARATOR};

// Crate-level exports - Runtime
pub use runtime::{Input, LocalAction, SessionHandle, spawn_session};

// Crate-level exports - Configuration and errors
pub use config::{DEFAULT_TURN_SECONDS, MAX_BOARD_SIZE, RulesConfig};
pub use error::{ConfigError, SessionClosed, SessionError, TransportError};
