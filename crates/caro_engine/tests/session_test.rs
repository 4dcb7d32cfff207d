//! Turn order, move legality, win/draw detection, timeouts and leaving.

mod common;

use caro_engine::{
    AUTOMATED_CHAT_REPLY, BoardError, Cell, Command, Message, Notification, Outcome, Phase, RulesConfig,
    SessionError, Side, TimerSignal, TimerSignalKind,
};
use common::{RemoteGame, bot_game, drain};

#[test]
fn test_turns_alternate() {
    let mut game = RemoteGame::started();
    assert_eq!(game.session.active_side(), Side::Local);

    game.session.request_move(7, 7).expect("Local move on local turn");
    assert_eq!(game.session.active_side(), Side::Remote);
    assert_eq!(game.sent(), vec![Message::Move { row: 7, col: 7 }]);

    let again = game.session.request_move(7, 8);
    assert!(matches!(again, Err(SessionError::InvalidTurn { actor: Side::Local, .. })));

    game.session.receive(Message::Move { row: 0, col: 0 }).expect("Remote move on remote turn");
    assert_eq!(game.session.active_side(), Side::Local);
    assert_eq!(game.session.board().filled(), 2);
}

#[test]
fn test_horizontal_five_wins() {
    let mut game = RemoteGame::started();
    game.exchange(&[((7, 0), (0, 0)), ((7, 1), (0, 1)), ((7, 2), (0, 2)), ((7, 3), (0, 3))]);
    game.clear();

    game.session.request_move(7, 4).expect("Winning move");
    assert_eq!(game.session.phase(), Phase::Ended);
    assert_eq!(game.session.outcome(), Some(Outcome::LocalWin));
    assert_eq!(game.sent(), vec![Message::Move { row: 7, col: 4 }, Message::Win]);
    assert!(
        game.notifications()
            .contains(&Notification::GameEnded { outcome: Outcome::LocalWin })
    );
    assert!(!game.session.timer().is_running());
}

#[test]
fn test_remote_five_loses() {
    let mut game = RemoteGame::started();
    game.exchange(&[((0, 0), (5, 0)), ((0, 2), (5, 1)), ((0, 4), (5, 2)), ((0, 6), (5, 3))]);
    game.session.request_move(0, 8).unwrap();
    game.session.remote_move(5, 4).unwrap();

    assert_eq!(game.session.outcome(), Some(Outcome::LocalLoss));
    // The follow-up claim agrees with the board.
    assert!(game.session.receive(Message::Win).is_ok());
}

#[test]
fn test_win_claim_without_win_rejected() {
    let mut game = RemoteGame::started();
    let claim = game.session.receive(Message::Win);
    assert!(matches!(claim, Err(SessionError::InvalidPhaseTransition { .. })));
    assert_eq!(game.session.phase(), Phase::InProgress);
}

#[test]
fn test_occupied_cell_rejected_without_change() {
    let mut game = RemoteGame::started();
    game.session.request_move(7, 7).unwrap();

    let result = game.session.remote_move(7, 7);
    assert!(matches!(
        result,
        Err(SessionError::IllegalMove {
            reason: BoardError::Occupied { .. },
            ..
        })
    ));
    assert_eq!(game.session.board().filled(), 1);
    assert_eq!(game.session.active_side(), Side::Remote);
    assert_eq!(game.session.board().get(7, 7), Some(Cell::Taken(Side::Local)));
}

#[test]
fn test_out_of_bounds_rejected() {
    let mut game = RemoteGame::started();
    let result = game.session.request_move(15, 0);
    assert!(matches!(
        result,
        Err(SessionError::IllegalMove {
            reason: BoardError::OutOfBounds { .. },
            ..
        })
    ));
    assert_eq!(game.session.active_side(), Side::Local);
    assert!(game.sent().is_empty());
}

#[test]
fn test_full_board_without_line_is_draw() {
    let mut game = RemoteGame::new(RulesConfig::new(3, 3, 30).unwrap());
    game.session.start_round(0).unwrap();
    game.exchange(&[((0, 0), (0, 1)), ((0, 2), (1, 1)), ((1, 0), (1, 2)), ((2, 1), (2, 0))]);
    game.session.request_move(2, 2).unwrap();

    assert!(game.session.board().is_full());
    assert_eq!(game.session.outcome(), Some(Outcome::Draw));
}

#[test]
fn test_moves_rejected_after_end() {
    let mut game = RemoteGame::started();
    game.session.receive(Message::Lose).unwrap();
    assert_eq!(game.session.outcome(), Some(Outcome::ForfeitByRemote));

    assert!(game.session.request_move(1, 1).is_err());
    assert!(game.session.remote_move(1, 1).is_err());
    assert_eq!(game.session.board().filled(), 0);
}

// ─────────────────────────────────────────────────────────────
//  Timer
// ─────────────────────────────────────────────────────────────

#[test]
fn test_local_timeout_forfeits() {
    let mut game = RemoteGame::started();
    let generation = game.session.timer().live_generation().expect("Countdown on local turn");

    game.session
        .handle_timer(TimerSignal::new(generation, TimerSignalKind::Expired));

    assert_eq!(game.session.outcome(), Some(Outcome::ForfeitByLocal));
    assert_eq!(game.sent(), vec![Message::Lose]);
}

#[test]
fn test_stale_expiry_discarded() {
    let mut game = RemoteGame::started();
    let first = game.session.timer().live_generation().unwrap();
    game.session.request_move(7, 7).unwrap();
    game.session.remote_move(0, 0).unwrap();
    let current = game.session.timer().live_generation().unwrap();
    assert_ne!(first, current);

    game.session
        .handle_timer(TimerSignal::new(first, TimerSignalKind::Expired));
    assert_eq!(game.session.phase(), Phase::InProgress);
    assert!(game.session.timer().is_running());
}

#[test]
fn test_expiry_counts_once() {
    let mut game = RemoteGame::started();
    let generation = game.session.timer().live_generation().unwrap();
    let expired = TimerSignal::new(generation, TimerSignalKind::Expired);

    game.session.handle_timer(expired);
    game.session.handle_timer(expired);

    let forfeits = game.sent().into_iter().filter(|m| *m == Message::Lose).count();
    assert_eq!(forfeits, 1);
    let endings = game
        .notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::GameEnded { .. }))
        .count();
    assert_eq!(endings, 1);
}

#[test]
fn test_remote_countdown_expiry_is_informational() {
    let mut game = RemoteGame::started();
    game.session.request_move(7, 7).unwrap();
    let generation = game.session.timer().live_generation().unwrap();

    game.session
        .handle_timer(TimerSignal::new(generation, TimerSignalKind::Expired));

    assert_eq!(game.session.phase(), Phase::InProgress);
    assert_eq!(game.session.active_side(), Side::Remote);
    assert!(!game.sent().contains(&Message::Lose));
}

#[test]
fn test_ticks_forwarded() {
    let mut game = RemoteGame::started();
    let generation = game.session.timer().live_generation().unwrap();
    game.session
        .handle_timer(TimerSignal::new(generation, TimerSignalKind::Tick { seconds_left: 12 }));

    assert_eq!(game.notifications(), vec![Notification::TimerTick { seconds_left: 12 }]);
    assert_eq!(game.session.timer().seconds_left(), 12);
}

// ─────────────────────────────────────────────────────────────
//  Leaving
// ─────────────────────────────────────────────────────────────

#[test]
fn test_leave_forfeits_live_round() {
    let mut game = RemoteGame::started();
    game.session.leave();

    assert_eq!(game.session.outcome(), Some(Outcome::ForfeitByLocal));
    assert_eq!(game.sent(), vec![Message::LeftRoom]);
    assert!(!game.session.timer().is_running());
}

#[test]
fn test_leave_after_end_keeps_outcome() {
    let mut game = RemoteGame::started();
    game.session.receive(Message::Lose).unwrap();
    game.clear();

    game.session.leave();
    assert_eq!(game.session.outcome(), Some(Outcome::ForfeitByRemote));
    assert_eq!(game.sent(), vec![Message::LeftRoom]);
}

#[test]
fn test_opponent_left() {
    let mut game = RemoteGame::started();
    game.session.receive(Message::LeftRoom).unwrap();

    assert_eq!(game.session.outcome(), Some(Outcome::ForfeitByRemote));
    let notes = game.notifications();
    assert!(notes.contains(&Notification::OpponentLeft));
    assert!(notes.contains(&Notification::GameEnded {
        outcome: Outcome::ForfeitByRemote
    }));
}

#[test]
fn test_chat_passes_through() {
    let mut game = RemoteGame::started();
    game.session.send_chat("good luck, have fun");
    game.session.send_chat("   ");
    game.session.receive(Message::Chat("you too".to_string())).unwrap();

    assert_eq!(game.sent(), vec![Message::Chat("good luck, have fun".to_string())]);
    assert_eq!(
        game.notifications(),
        vec![Notification::ChatReceived {
            text: "you too".to_string()
        }]
    );
}

#[test]
fn test_send_failure_keeps_local_move() {
    let mut game = RemoteGame::started();
    let (_, closed) = tokio::sync::mpsc::unbounded_channel();
    game.wire = closed;

    game.session.request_move(3, 3).expect("Move applies even if delivery fails");
    assert_eq!(game.session.board().get(3, 3), Some(Cell::Taken(Side::Local)));
    assert!(game.notifications().iter().any(|n| matches!(
        n,
        Notification::OutboundFailed {
            command: Command::Move,
            ..
        }
    )));
}

// ─────────────────────────────────────────────────────────────
//  Automated opponent
// ─────────────────────────────────────────────────────────────

#[test]
fn test_bot_answers_each_move() {
    let (mut session, _notes) = bot_game(RulesConfig::default());
    session.start_round(0).unwrap();

    session.request_move(7, 7).unwrap();
    assert_eq!(session.board().filled(), 2);
    assert_eq!(session.active_side(), Side::Local);
    assert_eq!(session.phase(), Phase::InProgress);
}

#[test]
fn test_bot_opens_odd_rounds() {
    let (mut session, _notes) = bot_game(RulesConfig::default());
    session.start_round(1).unwrap();

    assert_eq!(session.board().filled(), 1);
    assert_eq!(session.active_side(), Side::Local);
    assert!(session.timer().is_running());
}

#[test]
fn test_bot_rejects_wire_moves_and_replies_to_chat() {
    let (mut session, mut notes) = bot_game(RulesConfig::default());
    session.start_round(0).unwrap();
    drain(&mut notes);

    assert!(session.receive(Message::Move { row: 1, col: 1 }).is_err());
    session.send_chat("hello");
    assert_eq!(
        drain(&mut notes),
        vec![Notification::ChatReceived {
            text: AUTOMATED_CHAT_REPLY.to_string()
        }]
    );
}

#[test]
fn test_bot_plays_long_win_length() {
    let (mut session, _notes) = bot_game(RulesConfig::new(20, 20, 30).unwrap());
    session.start_round(0).unwrap();

    for col in 0..20 {
        if session.phase() != Phase::InProgress {
            break;
        }
        if session.board().is_empty_at(10, col) {
            session.request_move(10, col).unwrap();
        }
    }
    assert_eq!(session.active_side(), Side::Local);
    assert!(session.board().filled() >= 2);
}
