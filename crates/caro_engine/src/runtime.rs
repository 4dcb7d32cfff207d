//! Serialized session loop on tokio.
//!
//! One task owns the `Session`. Local actions, decoded remote messages,
//! and round control arrive on one queue; timer signals arrive on a second
//! queue fed by the session's own `TokioTimerDriver`. The task handles one
//! item at a time, so no two events ever touch the session concurrently.

use crate::config::RulesConfig;
use crate::error::{SessionClosed, SessionError};
use crate::events::Presenter;
use crate::protocol::Message;
use crate::session::{Adversary, Session};
use crate::timer::{TimerSignal, TokioTimerDriver};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Action requested by the local participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    /// Place a mark.
    Move {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
    },
    /// Propose a draw.
    RequestDraw,
    /// Answer the opponent's draw proposal.
    RespondToDraw {
        /// Whether to accept.
        accepted: bool,
    },
    /// Send chat text.
    Chat(String),
    /// Abandon the session.
    Leave,
}

/// One item on the session queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// From the presentation layer.
    Local(LocalAction),
    /// From the transport.
    Remote(Message),
    /// The opponent's connection closed without a `LEFT_ROOM`.
    Disconnected,
    /// Begin the given match round.
    StartRound(u32),
    /// Begin the round after the one that just ended.
    NextRound,
}

impl Session {
    /// Applies one queued input.
    #[instrument(skip(self))]
    pub fn handle(&mut self, input: Input) -> Result<(), SessionError> {
        match input {
            Input::Local(LocalAction::Move { row, col }) => self.request_move(row, col),
            Input::Local(LocalAction::RequestDraw) => self.request_draw(),
            Input::Local(LocalAction::RespondToDraw { accepted }) => self.respond_to_draw_request(accepted),
            Input::Local(LocalAction::Chat(text)) => {
                self.send_chat(&text);
                Ok(())
            }
            Input::Local(LocalAction::Leave) => {
                self.leave();
                Ok(())
            }
            Input::Remote(message) => self.receive(message),
            Input::Disconnected => {
                self.opponent_left();
                Ok(())
            }
            Input::StartRound(round) => self.start_round(round),
            Input::NextRound => self.start_next_round(),
        }
    }
}

/// Cloneable sender into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Input>,
}

impl SessionHandle {
    /// Queues an input.
    pub fn submit(&self, input: Input) -> Result<(), SessionClosed> {
        self.tx.send(input).map_err(|_| SessionClosed)
    }

    /// Queues a local move.
    pub fn request_move(&self, row: usize, col: usize) -> Result<(), SessionClosed> {
        self.submit(Input::Local(LocalAction::Move { row, col }))
    }

    /// Queues a local draw proposal.
    pub fn request_draw(&self) -> Result<(), SessionClosed> {
        self.submit(Input::Local(LocalAction::RequestDraw))
    }

    /// Queues the local answer to a pending draw proposal.
    pub fn respond_to_draw_request(&self, accepted: bool) -> Result<(), SessionClosed> {
        self.submit(Input::Local(LocalAction::RespondToDraw { accepted }))
    }

    /// Queues outgoing chat text.
    pub fn send_chat(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.submit(Input::Local(LocalAction::Chat(text.into())))
    }

    /// Queues leaving the session.
    pub fn leave(&self) -> Result<(), SessionClosed> {
        self.submit(Input::Local(LocalAction::Leave))
    }

    /// Queues a message received from the opponent.
    pub fn deliver(&self, message: Message) -> Result<(), SessionClosed> {
        self.submit(Input::Remote(message))
    }

    /// Queues the start of `round`.
    pub fn start_round(&self, round: u32) -> Result<(), SessionClosed> {
        self.submit(Input::StartRound(round))
    }

    /// Queues the start of the next round.
    pub fn next_round(&self) -> Result<(), SessionClosed> {
        self.submit(Input::NextRound)
    }
}

/// Spawns a session task on the current tokio runtime.
///
/// The task ends after the local side leaves or once every
/// `SessionHandle` is dropped, and yields the final session.
#[instrument(skip(adversary, presenter))]
pub fn spawn_session(
    rules: RulesConfig,
    adversary: Adversary,
    presenter: Box<dyn Presenter>,
) -> (SessionHandle, JoinHandle<Session>) {
    let (tx, inputs) = mpsc::unbounded_channel();
    let (timer_tx, timers) = mpsc::unbounded_channel::<TimerSignal>();
    let session = Session::new(rules, adversary, Box::new(TokioTimerDriver::new(timer_tx)), presenter);
    let task = tokio::spawn(run(session, inputs, timers));
    (SessionHandle { tx }, task)
}

async fn run(
    mut session: Session,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    mut timers: mpsc::UnboundedReceiver<TimerSignal>,
) -> Session {
    info!("Session loop started");
    loop {
        tokio::select! {
            input = inputs.recv() => {
                let Some(input) = input else {
                    debug!("All session handles dropped");
                    break;
                };
                let leaving = matches!(input, Input::Local(LocalAction::Leave));
                if let Err(e) = session.handle(input) {
                    warn!(error = %e, "Rejected session input");
                    session.report_rejection(&e);
                }
                if leaving {
                    break;
                }
            }
            Some(signal) = timers.recv() => session.handle_timer(signal),
        }
    }
    session.halt_timer();
    info!(phase = ?session.phase(), outcome = ?session.outcome(), "Session loop finished");
    session
}
