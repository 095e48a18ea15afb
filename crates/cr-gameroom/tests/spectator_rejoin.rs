use cr_core::Chips;
use cr_core::Epoch;
use cr_core::GameId;
use cr_core::ID;
use cr_core::PlayerId;
use cr_gameplay::EngineState;
use cr_gameplay::GameType;
use cr_gameroom::ActiveGame;
use cr_gameroom::RoomSink;
use cr_gameroom::ServerMessage;
use cr_gameroom::TimerConfig;
use std::collections::HashMap;

#[derive(Default)]
struct RecordingSink {
    sent: HashMap<PlayerId, Vec<ServerMessage>>,
}

impl RoomSink for RecordingSink {
    fn send(&mut self, player_id: PlayerId, message: ServerMessage) {
        self.sent.entry(player_id).or_default().push(message);
    }
    fn write_snapshot(&mut self, _state: &cr_gameplay::EngineState) {}
    fn delete_snapshot(&mut self) {}
}

fn fresh_game() -> ActiveGame {
    let state = EngineState::new(GameId::default(), "heads-up".into(), GameType::Cash, 5, 10, 9, 1000);
    ActiveGame::new(state, 2, TimerConfig::default())
}

/// A spectator joining mid-hand gets the live snapshot plus the hand's
/// event history so far, not just the current state in isolation.
#[test]
fn spectator_joining_mid_hand_receives_hand_events() {
    let mut game = fresh_game();
    let mut sink = RecordingSink::default();
    let a: PlayerId = ID::default();
    let b: PlayerId = ID::default();
    game.join_player(a, "alice".into(), &mut sink, 0).unwrap();
    game.join_player(b, "bob".into(), &mut sink, 0).unwrap();
    game.start_next_hand(&mut sink, 0).unwrap();

    let spectator: PlayerId = ID::default();
    game.join_spectator(spectator, "watcher".into(), &mut sink);

    let messages = sink.sent.get(&spectator).expect("spectator receives a GameJoined message");
    let (game_state, hand_events) = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::GameJoined { game_state, hand_events } => Some((game_state, hand_events)),
            _ => None,
        })
        .expect("spectator join produces GameJoined");

    let hand_events = hand_events.as_ref().expect("mid-hand join carries the event history");
    assert!(hand_events.iter().any(|e| matches!(e, cr_gameplay::EngineEvent::HandStart { .. })));
    assert!(hand_events.iter().any(|e| matches!(e, cr_gameplay::EngineEvent::BlindsPosted { .. })));
    assert!(hand_events.iter().any(|e| matches!(e, cr_gameplay::EngineEvent::Deal)));
    assert_eq!(game_state.hand_number, game.state().hand_number);

    let _: Epoch = game_state.hand_number;
    let _: Chips = game_state.small_blind_amount;
}
