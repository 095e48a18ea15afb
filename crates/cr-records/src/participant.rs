use cr_cards::Hole;
use cr_core::Chips;
use cr_core::HandId;
use cr_core::PlayerId;
use cr_core::Position;
use serde::Deserialize;
use serde::Serialize;

/// One player's participation in a hand. Composite key: `(hand, seat)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub hand: HandId,
    pub player_id: PlayerId,
    pub seat: Position,
    pub hole: Hole,
    pub starting_stack: Chips,
    pub showed: bool,
    pub mucked: bool,
}

impl Participant {
    pub fn new(hand: HandId, player_id: PlayerId, seat: Position, hole: Hole, starting_stack: Chips) -> Self {
        Self {
            hand,
            player_id,
            seat,
            hole,
            starting_stack,
            showed: false,
            mucked: false,
        }
    }
    pub fn show(&mut self) {
        self.showed = true;
    }
    pub fn muck(&mut self) {
        self.mucked = true;
    }
}
