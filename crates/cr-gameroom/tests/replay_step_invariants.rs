use cr_core::GameId;
use cr_core::ID;
use cr_core::PlayerId;
use cr_gameplay::EngineEvent;
use cr_gameplay::EngineState;
use cr_gameplay::GameType;
use cr_gameroom::ActiveGame;
use cr_gameroom::GameConfig;
use cr_gameroom::ReplayEntry;
use cr_gameroom::ReplayInstance;
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

fn community_card_count_for(event: &EngineEvent) -> Option<usize> {
    match event {
        EngineEvent::Flop { .. } => Some(3),
        EngineEvent::Turn { .. } => Some(4),
        EngineEvent::River { .. } => Some(5),
        _ => None,
    }
}

/// Records a hand end to end (folding it out via the action clock so the
/// test never has to guess a legal bet size), turns the recording into a
/// replay file, and steps through every position verifying that what gets
/// rendered at each position matches what was actually recorded there.
#[test]
fn stepping_through_a_recorded_hand_matches_what_was_recorded() {
    let game_id = GameId::default();
    let state = EngineState::new(game_id, "heads-up".into(), GameType::Cash, 5, 10, 9, 1000);
    let mut game = ActiveGame::new(state, 2, TimerConfig::default());
    let mut sink = RecordingSink::default();
    let a: PlayerId = ID::default();
    let b: PlayerId = ID::default();
    game.join_player(a, "alice".into(), &mut sink, 0).unwrap();
    game.join_player(b, "bob".into(), &mut sink, 0).unwrap();
    game.start_next_hand(&mut sink, 0).unwrap();

    // Drive the hand to completion purely via elapsed-clock defaults.
    let mut now = 1_000;
    for _ in 0..40 {
        if game.state().active_player_id.is_none() {
            break;
        }
        game.apply_timeout(&mut sink, now).unwrap();
        now += 1_000;
    }

    let config = GameConfig {
        game_id,
        game_name: "heads-up".into(),
        small_blind_amount: 5,
        big_blind_amount: 10,
        max_players: 9,
        starting_stack: 1000,
    };
    let replay_file = game.finish(config);
    assert!(!replay_file.entries.is_empty());

    let mut replay = ReplayInstance::new(replay_file.clone());
    let viewer: PlayerId = ID::default();
    replay.add_spectator(viewer);

    for position in 0..replay.len() {
        replay.set_position(viewer, position);
        let rendered = replay.render(viewer).expect("every recorded position renders");
        let ServerMessage::ReplayState { position: rendered_position, hand_number, stage, game_state, .. } = rendered else {
            panic!("replay render always yields ReplayState");
        };
        assert_eq!(rendered_position, position);

        let ReplayEntry::Event { event, engine_state, .. } = &replay_file.entries[position] else {
            continue; // chat entries render the prior event's state, checked implicitly elsewhere
        };
        assert_eq!(hand_number, engine_state.hand_number);
        assert_eq!(stage, engine_state.stage);
        assert_eq!(game_state.hand_number, engine_state.hand_number);

        if let Some(expected_cards) = community_card_count_for(event) {
            assert_eq!(engine_state.community_cards.len(), expected_cards);
        }
    }
}
