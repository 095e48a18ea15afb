use serde::Deserialize;
use serde::Serialize;

/// Phase within a hand, from the first hole card to pot award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Stage {
    /// The stage after this one sweeps, or `None` past the river.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::PreFlop => Some(Stage::Flop),
            Stage::Flop => Some(Stage::Turn),
            Stage::Turn => Some(Stage::River),
            Stage::River => Some(Stage::Showdown),
            Stage::Showdown => None,
        }
    }
    /// How many community cards are revealed at the start of this stage.
    pub fn cards_dealt(self) -> usize {
        match self {
            Stage::PreFlop => 0,
            Stage::Flop => 3,
            Stage::Turn => 1,
            Stage::River => 1,
            Stage::Showdown => 0,
        }
    }
}
