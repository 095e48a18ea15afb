use cr_core::GameId;
use cr_core::ID;
use cr_core::PlayerId;
use cr_gameplay::EngineEvent;
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

/// A player left on the clock past their time limit is resolved
/// automatically: the room records a `PlayerTimeout` event naming the
/// default action taken on their behalf, and the hand moves on without
/// that player's input.
#[test]
fn elapsed_clock_resolves_with_the_default_action() {
    let mut game = fresh_game();
    let mut sink = RecordingSink::default();
    let a: PlayerId = ID::default();
    let b: PlayerId = ID::default();
    game.join_player(a, "alice".into(), &mut sink, 0).unwrap();
    game.join_player(b, "bob".into(), &mut sink, 0).unwrap();
    game.start_next_hand(&mut sink, 0).unwrap();

    let on_the_clock = game.state().active_player_id.expect("someone is on the clock after a hand starts");
    let hand_number_before = game.state().hand_number;

    game.apply_timeout(&mut sink, 1_000).unwrap();

    let saw_timeout = sink.sent.values().flatten().any(|m| {
        matches!(
            m,
            ServerMessage::GameState { event: EngineEvent::PlayerTimeout { player_id, .. }, .. }
                if *player_id == on_the_clock
        )
    });
    assert!(saw_timeout, "every viewer is broadcast the PLAYER_TIMEOUT transition");
    // Either the hand advanced (a fold/check resolved the street) or the
    // next hand started; either way the engine made forward progress.
    assert!(game.state().hand_number >= hand_number_before);
}
