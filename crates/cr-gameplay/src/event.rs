use crate::action::Action;
use crate::state::EngineState;
use cr_cards::Card;
use cr_cards::HandStrength;
use cr_cards::Hole;
use cr_core::Chips;
use cr_core::Epoch;
use cr_core::PlayerId;
use cr_core::Position;
use serde::Deserialize;
use serde::Serialize;

/// One entry of a showdown result: a single player's revealed hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownResult {
    pub player_id: PlayerId,
    pub hole_cards: Hole,
    pub hand_rank: HandStrength,
    pub hand_description: String,
}

/// One entry of a `HAND_END` pot award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub player_id: PlayerId,
    pub amount: Chips,
    pub pot_index: usize,
}

/// A blind post, reported by `BLINDS_POSTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindPost {
    pub player_id: PlayerId,
    pub amount: Chips,
}

/// Everything the engine can emit. One event always accompanies exactly one
/// resulting `EngineState` inside a `Transition` — never a stale state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    HandStart {
        hand_number: Epoch,
        dealer_seat_index: Position,
    },
    BlindsPosted {
        small_blind: BlindPost,
        big_blind: BlindPost,
    },
    Deal,
    Flop {
        cards: [Card; 3],
    },
    Turn {
        card: Card,
    },
    River {
        card: Card,
    },
    PlayerAction {
        player_id: PlayerId,
        action: Action,
    },
    PlayerTimeout {
        player_id: PlayerId,
        default_action: Action,
    },
    Showdown {
        results: Vec<ShowdownResult>,
    },
    HandEnd {
        winners: Vec<Winner>,
    },
    PlayerRevealed {
        player_id: PlayerId,
        hole_cards: Hole,
    },
    PlayerJoined {
        player_id: PlayerId,
        display_name: String,
        seat_index: Position,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
}

/// One step of engine output: the event that occurred and the state as of
/// that event. Consumers that retain `state` (the replay recorder) get an
/// independent clone, never a reference into the next transition's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: EngineState,
    pub event: EngineEvent,
}
