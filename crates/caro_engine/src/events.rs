//! Notifications the engine pushes to the presentation layer.
//!
//! The presentation layer renders these and keeps no game state of its
//! own; whose turn it is, whether a draw can be offered, and whether the
//! round is over all follow from what the engine reports here.

use crate::board::{Mark, Side};
use crate::protocol::Command;
use crate::session::{Outcome, Phase};
use std::fmt::Debug;
use tokio::sync::mpsc;
use tracing::debug;

/// Something the presentation layer should reflect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A new round began.
    RoundStarted {
        /// Match round number.
        round: u32,
        /// Mark the local side plays this round.
        local_mark: Mark,
        /// Side that moves first.
        first: Side,
    },
    /// A cell was marked.
    BoardChanged {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
        /// Side that played.
        side: Side,
        /// Mark drawn in the cell.
        mark: Mark,
    },
    /// The turn passed to `active`.
    TurnChanged {
        /// Side now allowed to move.
        active: Side,
    },
    /// The session phase changed without a change of turn.
    PhaseChanged {
        /// New phase.
        phase: Phase,
    },
    /// Seconds remaining on the live countdown.
    TimerTick {
        /// Seconds left.
        seconds_left: u32,
    },
    /// The round reached a terminal outcome.
    GameEnded {
        /// How it ended, from the local side's view.
        outcome: Outcome,
    },
    /// The opponent proposed a draw and awaits a local answer.
    DrawRequestReceived,
    /// The opponent answered the local draw proposal.
    DrawResponseReceived {
        /// Whether the draw was accepted.
        accepted: bool,
    },
    /// Chat text from the opponent.
    ChatReceived {
        /// Message text.
        text: String,
    },
    /// The opponent left the session.
    OpponentLeft,
    /// An event was refused and left the session unchanged.
    Rejected {
        /// Why it was refused.
        reason: String,
    },
    /// An outbound message could not be handed to the transport.
    OutboundFailed {
        /// Command that was being sent.
        command: Command,
        /// Transport failure description.
        reason: String,
    },
}

/// Receiver of engine notifications.
pub trait Presenter: Send + Debug {
    /// Delivers one notification.
    fn notify(&mut self, notification: Notification);
}

impl Presenter for mpsc::UnboundedSender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if self.send(notification).is_err() {
            debug!("Presentation channel closed, dropping notification");
        }
    }
}
