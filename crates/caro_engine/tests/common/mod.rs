//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use caro_engine::{
    Adversary, Generation, HeuristicOpponent, Message, Notification, RulesConfig, Session, TimerDriver,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Timer driver that only records what the session asked for.
#[derive(Debug, Default, Clone)]
pub struct RecordingDriver {
    pub armed: Arc<Mutex<Vec<(Generation, u32)>>>,
    pub disarms: Arc<Mutex<usize>>,
}

impl TimerDriver for RecordingDriver {
    fn arm(&mut self, generation: Generation, seconds: u32) {
        self.armed.lock().unwrap().push((generation, seconds));
    }

    fn disarm(&mut self) {
        *self.disarms.lock().unwrap() += 1;
    }
}

/// Session against a remote peer, with its notification and wire queues.
pub struct RemoteGame {
    pub session: Session,
    pub notes: mpsc::UnboundedReceiver<Notification>,
    pub wire: mpsc::UnboundedReceiver<Message>,
}

impl RemoteGame {
    pub fn new(rules: RulesConfig) -> Self {
        let (note_tx, notes) = mpsc::unbounded_channel();
        let (wire_tx, wire) = mpsc::unbounded_channel();
        let session = Session::new(
            rules,
            Adversary::Remote(Box::new(wire_tx)),
            Box::new(RecordingDriver::default()),
            Box::new(note_tx),
        );
        Self { session, notes, wire }
    }

    /// Session with round 0 already started.
    pub fn started() -> Self {
        let mut game = Self::new(RulesConfig::default());
        game.session.start_round(0).unwrap();
        game.clear();
        game
    }

    pub fn sent(&mut self) -> Vec<Message> {
        drain(&mut self.wire)
    }

    pub fn notifications(&mut self) -> Vec<Notification> {
        drain(&mut self.notes)
    }

    pub fn clear(&mut self) {
        self.sent();
        self.notifications();
    }

    /// Plays alternating local and remote moves, local first.
    pub fn exchange(&mut self, moves: &[((usize, usize), (usize, usize))]) {
        for &((lr, lc), (rr, rc)) in moves {
            self.session.request_move(lr, lc).unwrap();
            self.session.remote_move(rr, rc).unwrap();
        }
    }
}

/// Session against the built-in bot.
pub fn bot_game(rules: RulesConfig) -> (Session, mpsc::UnboundedReceiver<Notification>) {
    let (note_tx, notes) = mpsc::unbounded_channel();
    let bot = HeuristicOpponent::new(*rules.win_length());
    let session = Session::new(
        rules,
        Adversary::Automated(Box::new(bot)),
        Box::new(RecordingDriver::default()),
        Box::new(note_tx),
    );
    (session, notes)
}

pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}
