use cr_cards::Card;
use cr_core::Chips;
use cr_core::GameId;
use cr_core::HandId;
use cr_core::Position;
use serde::Deserialize;
use serde::Serialize;

/// Persistent record of one completed hand, independent of the live
/// `EngineState` that produced it — this is what a history query or a
/// leaderboard reads, not what the engine replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    pub id: HandId,
    pub game_id: GameId,
    pub hand_number: u64,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub dealer_seat_index: Position,
}

impl HandRecord {
    pub fn new(
        id: HandId,
        game_id: GameId,
        hand_number: u64,
        board: Vec<Card>,
        pot: Chips,
        dealer_seat_index: Position,
    ) -> Self {
        Self {
            id,
            game_id,
            hand_number,
            board,
            pot,
            dealer_seat_index,
        }
    }
}
