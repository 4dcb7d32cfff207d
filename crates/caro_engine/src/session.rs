//! Authoritative per-match state machine.
//!
//! A `Session` is single-writer: every event reaches it through `&mut self`
//! on one thread of control (see [`crate::runtime`]). It validates the
//! event against the current phase and turn, mutates the board, consults
//! the rules, and emits notifications and outbound messages. Rejected
//! events return a [`SessionError`] and leave the session untouched.
//!
//! ```text
//! AwaitingOpponent ──start_round──▶ InProgress ◀──▶ DrawRequestedByLocal
//!                                      │  ▲ ▲──▶ DrawRequestedByRemote
//!                                      ▼  │
//!                                    Ended ──start_next_round──┘
//! ```

use crate::board::{Board, Coord, Mark, Side};
use crate::config::RulesConfig;
use crate::error::SessionError;
use crate::events::{Notification, Presenter};
use crate::opponent::Opponent;
use crate::protocol::{Message, Outbound};
use crate::rules::{check_win, is_draw};
use crate::timer::{TimerDriver, TimerSignal, TimerSignalKind, TurnTimer};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// Reply surfaced when chatting with the automated opponent.
pub const AUTOMATED_CHAT_REPLY: &str = "I am a bot and cannot chat.";

/// Lifecycle phase of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No round has started yet.
    AwaitingOpponent,
    /// Moves are accepted from the active side.
    InProgress,
    /// The local side proposed a draw and awaits the answer.
    DrawRequestedByLocal,
    /// The opponent proposed a draw and awaits the local answer.
    DrawRequestedByRemote,
    /// The round has an outcome. Terminal until the next round starts.
    Ended,
}

impl Phase {
    /// Returns true while a round is being played, draw negotiation included.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Phase::InProgress | Phase::DrawRequestedByLocal | Phase::DrawRequestedByRemote
        )
    }
}

/// How a round ended, from the local side's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The local side completed a winning run.
    LocalWin,
    /// The opponent completed a winning run.
    LocalLoss,
    /// Full board or agreed draw.
    Draw,
    /// The local side timed out or left.
    ForfeitByLocal,
    /// The opponent timed out or left.
    ForfeitByRemote,
}

/// Turn order and marks for one round.
///
/// A pure function of the match round number: the local side moves first
/// with `X` on even rounds and second with `O` on odd rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seating {
    /// Side that moves first.
    pub first: Side,
    /// Mark of the local side.
    pub local_mark: Mark,
}

impl Seating {
    /// Derives the seating for `round`.
    pub fn for_round(round: u32) -> Self {
        if round % 2 == 0 {
            Self {
                first: Side::Local,
                local_mark: Mark::X,
            }
        } else {
            Self {
                first: Side::Remote,
                local_mark: Mark::O,
            }
        }
    }

    /// Mark played by `side`.
    pub fn mark_of(&self, side: Side) -> Mark {
        match side {
            Side::Local => self.local_mark,
            Side::Remote => self.local_mark.other(),
        }
    }
}

/// Who the local side is playing against.
#[derive(Debug)]
pub enum Adversary {
    /// A peer reached through the relay.
    Remote(Box<dyn Outbound>),
    /// A bot driven synchronously by the session.
    Automated(Box<dyn Opponent>),
}

/// Game session engine for one match.
#[derive(Debug)]
pub struct Session {
    rules: RulesConfig,
    round: u32,
    seating: Seating,
    active: Side,
    phase: Phase,
    outcome: Option<Outcome>,
    board: Board,
    adversary: Adversary,
    timer: TurnTimer,
    presenter: Box<dyn Presenter>,
}

impl Session {
    /// Creates a session waiting for its first round.
    #[instrument(skip(timer_driver, adversary, presenter))]
    pub fn new(
        rules: RulesConfig,
        adversary: Adversary,
        timer_driver: Box<dyn TimerDriver>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        info!(
            automated = matches!(adversary, Adversary::Automated(_)),
            "Creating game session"
        );
        Self {
            rules,
            round: 0,
            seating: Seating::for_round(0),
            active: Side::Local,
            phase: Phase::AwaitingOpponent,
            outcome: None,
            board: Board::new(*rules.board_size()),
            adversary,
            timer: TurnTimer::new(timer_driver),
            presenter,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcome of the round; `Some` exactly when the phase is `Ended`.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Side allowed to move.
    pub fn active_side(&self) -> Side {
        self.active
    }

    /// Match round number of the current round.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Board of the current round.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seating of the current round.
    pub fn seating(&self) -> Seating {
        self.seating
    }

    /// Rules in force.
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Returns true when the opponent is the built-in bot.
    pub fn is_automated(&self) -> bool {
        matches!(self.adversary, Adversary::Automated(_))
    }

    /// Turn timer state.
    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    // ─────────────────────────────────────────────────────────────
    //  Round lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Starts round `round` on a fresh board.
    ///
    /// Seating is re-derived from the round number. If the bot moves first
    /// it plays immediately and the turn comes back to the local side.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn start_round(&mut self, round: u32) -> Result<(), SessionError> {
        if self.phase.is_live() {
            warn!("Round start requested while a round is live");
            return Err(SessionError::InvalidPhaseTransition {
                action: "start a round",
                phase: self.phase,
            });
        }

        self.timer.stop();
        self.round = round;
        self.seating = Seating::for_round(round);
        self.board = Board::new(*self.rules.board_size());
        self.outcome = None;
        self.phase = Phase::InProgress;
        self.active = self.seating.first;
        info!(
            round,
            first = ?self.seating.first,
            local_mark = %self.seating.local_mark,
            "Round started"
        );
        self.notify(Notification::RoundStarted {
            round,
            local_mark: self.seating.local_mark,
            first: self.seating.first,
        });
        self.notify(Notification::TurnChanged { active: self.active });

        match (self.active, self.is_automated()) {
            (Side::Remote, true) => self.play_automated_turn(),
            _ => self.start_countdown(),
        }
        Ok(())
    }

    /// Starts the round after an ended one, with the next round number.
    ///
    /// A remote opponent is sent `REMATCH` first so it advances too before
    /// any move of the new round reaches it.
    #[instrument(skip(self), fields(round = self.round))]
    pub fn start_next_round(&mut self) -> Result<(), SessionError> {
        let next = self.next_round_number()?;
        self.send(Message::Rematch);
        self.start_round(next)
    }

    /// The remote opponent started the next round.
    ///
    /// Advances an ended round; ignored when this side already advanced on
    /// its own, since both sides then moved past the same boundary.
    #[instrument(skip(self), fields(phase = ?self.phase, round = self.round))]
    pub fn rematch_received(&mut self) -> Result<(), SessionError> {
        if self.is_automated() {
            return Err(SessionError::InvalidPhaseTransition {
                action: "receive a rematch",
                phase: self.phase,
            });
        }
        if self.phase.is_live() {
            debug!("Already playing the next round");
            return Ok(());
        }
        let next = self.next_round_number()?;
        info!(next, "Opponent started the next round");
        self.start_round(next)
    }

    fn next_round_number(&self) -> Result<u32, SessionError> {
        if self.phase != Phase::Ended {
            return Err(SessionError::InvalidPhaseTransition {
                action: "start the next round",
                phase: self.phase,
            });
        }
        self.round.checked_add(1).ok_or_else(|| {
            warn!("Round counter exhausted");
            SessionError::InvalidPhaseTransition {
                action: "start a round past the last round number",
                phase: self.phase,
            }
        })
    }

    // ─────────────────────────────────────────────────────────────
    //  Moves
    // ─────────────────────────────────────────────────────────────

    /// Plays a local move.
    #[instrument(skip(self), fields(phase = ?self.phase, active = ?self.active))]
    pub fn request_move(&mut self, row: usize, col: usize) -> Result<(), SessionError> {
        self.ensure_turn(Side::Local)?;
        self.board.place(row, col, Side::Local).inspect_err(|e| {
            warn!(error = %e, "Rejected local move");
        })?;
        self.timer.stop();
        self.announce_placement(row, col, Side::Local);
        if matches!(self.adversary, Adversary::Remote(_)) {
            self.send(Message::Move { row, col });
        }
        self.settle(Coord::new(row, col), Side::Local);
        Ok(())
    }

    /// Applies a move received from the remote opponent.
    #[instrument(skip(self), fields(phase = ?self.phase, active = ?self.active))]
    pub fn remote_move(&mut self, row: usize, col: usize) -> Result<(), SessionError> {
        if self.is_automated() {
            return Err(self.invalid_turn(Side::Remote));
        }
        self.ensure_turn(Side::Remote)?;
        self.board.place(row, col, Side::Remote).inspect_err(|e| {
            warn!(error = %e, "Rejected remote move");
        })?;
        self.timer.stop();
        self.announce_placement(row, col, Side::Remote);
        self.settle(Coord::new(row, col), Side::Remote);
        Ok(())
    }

    fn ensure_turn(&self, actor: Side) -> Result<(), SessionError> {
        if self.phase != Phase::InProgress || self.active != actor {
            warn!(?actor, "Out-of-turn action");
            return Err(self.invalid_turn(actor));
        }
        Ok(())
    }

    fn invalid_turn(&self, actor: Side) -> SessionError {
        SessionError::InvalidTurn {
            actor,
            phase: self.phase,
            active: self.active,
        }
    }

    fn announce_placement(&mut self, row: usize, col: usize, side: Side) {
        debug!(row, col, ?side, "Mark placed");
        let mark = self.seating.mark_of(side);
        self.notify(Notification::BoardChanged { row, col, side, mark });
    }

    /// Resolves the position after `side` played `cell`: win, draw, or a
    /// handover of the turn.
    fn settle(&mut self, cell: Coord, side: Side) {
        let win_length = *self.rules.win_length();
        if check_win(&self.board, cell.row, cell.col, side, win_length) {
            if side == Side::Local && !self.is_automated() {
                self.send(Message::Win);
            }
            let outcome = match side {
                Side::Local => Outcome::LocalWin,
                Side::Remote => Outcome::LocalLoss,
            };
            self.finish(outcome);
            return;
        }
        if is_draw(&self.board, cell, side, win_length) {
            self.finish(Outcome::Draw);
            return;
        }

        self.active = side.opponent();
        self.notify(Notification::TurnChanged { active: self.active });
        match (self.active, self.is_automated()) {
            (Side::Remote, true) => self.play_automated_turn(),
            _ => self.start_countdown(),
        }
    }

    fn play_automated_turn(&mut self) {
        let Adversary::Automated(opponent) = &mut self.adversary else {
            return;
        };
        let Some(cell) = opponent.select_move(&self.board, Side::Remote, Side::Local) else {
            error!("Automated opponent found no move on a live board");
            self.finish(Outcome::Draw);
            return;
        };
        if let Err(e) = self.board.place(cell.row, cell.col, Side::Remote) {
            error!(error = %e, %cell, "Automated opponent chose an illegal cell");
            self.finish(Outcome::ForfeitByRemote);
            return;
        }
        self.announce_placement(cell.row, cell.col, Side::Remote);
        self.settle(cell, Side::Remote);
    }

    // ─────────────────────────────────────────────────────────────
    //  Timer
    // ─────────────────────────────────────────────────────────────

    fn start_countdown(&mut self) {
        let seconds = *self.rules.turn_seconds();
        self.timer.stop();
        self.timer.start(seconds);
        self.notify(Notification::TimerTick { seconds_left: seconds });
    }

    /// Feeds a timer driver signal into the session.
    ///
    /// Signals from a stopped or superseded countdown are discarded. An
    /// expiry on the local side's turn forfeits the round; an expiry on
    /// the remote side's turn only ends its displayed countdown, since the
    /// remote reports its own timeout.
    #[instrument(skip(self), fields(phase = ?self.phase, active = ?self.active))]
    pub fn handle_timer(&mut self, signal: TimerSignal) {
        let Some(kind) = self.timer.accept(signal) else {
            return;
        };
        match kind {
            TimerSignalKind::Tick { seconds_left } => {
                self.notify(Notification::TimerTick { seconds_left });
            }
            TimerSignalKind::Expired => {
                self.notify(Notification::TimerTick { seconds_left: 0 });
                if self.phase.is_live() && self.active == Side::Local {
                    info!("Local turn timed out");
                    if !self.is_automated() {
                        self.send(Message::Lose);
                    }
                    self.finish(Outcome::ForfeitByLocal);
                } else {
                    debug!("Opponent countdown ran out, awaiting their report");
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Draw negotiation
    // ─────────────────────────────────────────────────────────────

    /// Proposes a draw on the local side's turn.
    ///
    /// The bot answers on the spot; a remote opponent answers later
    /// through [`Session::draw_response_received`].
    #[instrument(skip(self), fields(phase = ?self.phase, active = ?self.active))]
    pub fn request_draw(&mut self) -> Result<(), SessionError> {
        if matches!(self.phase, Phase::DrawRequestedByLocal | Phase::DrawRequestedByRemote) {
            return Err(SessionError::InvalidPhaseTransition {
                action: "request a draw",
                phase: self.phase,
            });
        }
        self.ensure_turn(Side::Local)?;
        self.set_phase(Phase::DrawRequestedByLocal);

        let immediate_answer = match &self.adversary {
            Adversary::Automated(opponent) => Some(opponent.accepts_draw(&self.board, Side::Remote)),
            Adversary::Remote(_) => None,
        };
        match immediate_answer {
            Some(accepted) => {
                info!(accepted, "Automated opponent answered draw request");
                self.resolve_local_request(accepted);
            }
            None => self.send(Message::DrawRequest),
        }
        Ok(())
    }

    /// Records a draw proposal from the remote opponent.
    ///
    /// Neither the turn nor the timer change while the proposal is pending.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn draw_request_received(&mut self) -> Result<(), SessionError> {
        if self.is_automated() || self.phase != Phase::InProgress {
            return Err(SessionError::InvalidPhaseTransition {
                action: "receive a draw request",
                phase: self.phase,
            });
        }
        self.set_phase(Phase::DrawRequestedByRemote);
        self.notify(Notification::DrawRequestReceived);
        Ok(())
    }

    /// Answers the remote opponent's pending draw proposal.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn respond_to_draw_request(&mut self, accepted: bool) -> Result<(), SessionError> {
        if self.phase != Phase::DrawRequestedByRemote {
            return Err(SessionError::InvalidPhaseTransition {
                action: "answer a draw request",
                phase: self.phase,
            });
        }
        if accepted {
            self.send(Message::DrawConfirm);
            self.finish(Outcome::Draw);
        } else {
            self.send(Message::DrawRefuse);
            self.set_phase(Phase::InProgress);
        }
        Ok(())
    }

    /// Applies the remote opponent's answer to the local draw proposal.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn draw_response_received(&mut self, accepted: bool) -> Result<(), SessionError> {
        if self.phase != Phase::DrawRequestedByLocal {
            return Err(SessionError::InvalidPhaseTransition {
                action: "receive a draw response",
                phase: self.phase,
            });
        }
        self.resolve_local_request(accepted);
        Ok(())
    }

    fn resolve_local_request(&mut self, accepted: bool) {
        self.notify(Notification::DrawResponseReceived { accepted });
        if accepted {
            self.finish(Outcome::Draw);
        } else {
            self.set_phase(Phase::InProgress);
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Leaving and forfeits
    // ─────────────────────────────────────────────────────────────

    /// The local side abandons the session.
    ///
    /// A live round is forfeited. `LEFT_ROOM` is sent to a remote opponent
    /// even after the round ended so the relay can close the room.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn leave(&mut self) {
        self.timer.stop();
        if !self.is_automated() {
            self.send(Message::LeftRoom);
        }
        if self.phase != Phase::Ended {
            self.finish(Outcome::ForfeitByLocal);
        }
    }

    /// The remote opponent left the session.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn opponent_left(&mut self) {
        self.timer.stop();
        self.notify(Notification::OpponentLeft);
        if self.phase != Phase::Ended {
            self.finish(Outcome::ForfeitByRemote);
        }
    }

    /// The remote opponent reported its own forfeit, usually a timeout.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn opponent_forfeited(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_live() {
            return Err(SessionError::InvalidPhaseTransition {
                action: "accept an opponent forfeit",
                phase: self.phase,
            });
        }
        self.finish(Outcome::ForfeitByRemote);
        Ok(())
    }

    /// The remote opponent claimed victory.
    ///
    /// The claim is only consistent right after its winning move ended the
    /// round; it never changes state.
    #[instrument(skip(self), fields(phase = ?self.phase, outcome = ?self.outcome))]
    pub fn opponent_claimed_win(&mut self) -> Result<(), SessionError> {
        if self.outcome == Some(Outcome::LocalLoss) {
            debug!("Opponent win claim matches local result");
            return Ok(());
        }
        warn!("Opponent claimed a win the local board does not show");
        Err(SessionError::InvalidPhaseTransition {
            action: "accept an opponent win claim",
            phase: self.phase,
        })
    }

    // ─────────────────────────────────────────────────────────────
    //  Chat
    // ─────────────────────────────────────────────────────────────

    /// Sends chat text to the opponent. Blank text is ignored.
    #[instrument(skip(self, text))]
    pub fn send_chat(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.is_automated() {
            self.notify(Notification::ChatReceived {
                text: AUTOMATED_CHAT_REPLY.to_string(),
            });
        } else {
            self.send(Message::Chat(text.to_string()));
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Inbound wire messages
    // ─────────────────────────────────────────────────────────────

    /// Dispatches a message received from the remote opponent.
    #[instrument(skip(self), fields(command = %message.command()))]
    pub fn receive(&mut self, message: Message) -> Result<(), SessionError> {
        match message {
            Message::Move { row, col } => self.remote_move(row, col),
            Message::DrawRequest => self.draw_request_received(),
            Message::DrawConfirm => self.draw_response_received(true),
            Message::DrawRefuse => self.draw_response_received(false),
            Message::LeftRoom => {
                self.opponent_left();
                Ok(())
            }
            Message::Lose => self.opponent_forfeited(),
            Message::Win => self.opponent_claimed_win(),
            Message::Rematch => self.rematch_received(),
            Message::Chat(text) => {
                self.notify(Notification::ChatReceived { text });
                Ok(())
            }
        }
    }

    /// Reports a rejected event to the presentation layer.
    pub fn report_rejection(&mut self, error: &SessionError) {
        self.notify(Notification::Rejected {
            reason: error.to_string(),
        });
    }

    /// Stops the turn timer without touching the round, for use when the
    /// session is being torn down.
    pub fn halt_timer(&mut self) {
        self.timer.stop();
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    fn finish(&mut self, outcome: Outcome) {
        self.timer.stop();
        self.phase = Phase::Ended;
        self.outcome = Some(outcome);
        info!(round = self.round, ?outcome, "Round ended");
        self.notify(Notification::GameEnded { outcome });
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "Phase change");
        self.phase = phase;
        self.notify(Notification::PhaseChanged { phase });
    }

    fn notify(&mut self, notification: Notification) {
        self.presenter.notify(notification);
    }

    fn send(&mut self, message: Message) {
        let Adversary::Remote(outbound) = &mut self.adversary else {
            return;
        };
        let command = message.command();
        if let Err(e) = outbound.send(message) {
            warn!(%command, error = %e, "Outbound send failed");
            self.notify(Notification::OutboundFailed {
                command,
                reason: e.to_string(),
            });
        }
    }
}
