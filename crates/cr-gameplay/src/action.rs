use cr_core::Chips;
use serde::Deserialize;
use serde::Serialize;

/// A player's requested action. `amount` is the incremental chip count added
/// this turn for `Bet`/`Raise`, never an absolute target bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet { amount: Chips },
    Raise { amount: Chips },
    AllIn,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Fold => ActionKind::Fold,
            Action::Check => ActionKind::Check,
            Action::Call => ActionKind::Call,
            Action::Bet { .. } => ActionKind::Bet,
            Action::Raise { .. } => ActionKind::Raise,
            Action::AllIn => ActionKind::AllIn,
        }
    }
}

/// An action variant without an amount, used when enumerating legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// A legal action and its amount bounds (absent for actions that carry no
/// amount, exact-amount actions report the same value as both bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalAction {
    pub kind: ActionKind,
    pub min_amount: Option<Chips>,
    pub max_amount: Option<Chips>,
}
