use cr_core::Epoch;
use cr_core::HandId;
use cr_core::PlayerId;
use cr_gameplay::Action;
use serde::Deserialize;
use serde::Serialize;

/// One recorded action within a hand. Composite key: `(hand, seq)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub hand: HandId,
    pub seq: Epoch,
    pub player_id: PlayerId,
    pub action: Action,
}

impl Play {
    pub fn new(hand: HandId, seq: Epoch, player_id: PlayerId, action: Action) -> Self {
        Self {
            hand,
            seq,
            player_id,
            action,
        }
    }
}
