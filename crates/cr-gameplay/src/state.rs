use crate::event::EngineEvent;
use crate::pot::PotBreakdown;
use crate::stage::Stage;
use cr_cards::Card;
use cr_cards::Deck;
use cr_cards::Hole;
use cr_core::Chips;
use cr_core::Epoch;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_core::Position;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Cash,
    Tournament,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatRole {
    Player,
    Spectator,
}

/// A spectator's visibility into hole cards that are not their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectatorVisibility {
    Immediate,
    Delayed,
    Showdown,
}

/// One seat: a player or a spectator occupying a synthetic seat beyond
/// `maxPlayers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePlayer {
    pub id: PlayerId,
    pub display_name: String,
    pub seat_index: Position,
    pub role: SeatRole,
    pub stack: Chips,
    pub bet: Chips,
    pub pot_share: Chips,
    pub folded: bool,
    pub hole_cards: Option<Hole>,
    pub connected: bool,
    pub is_all_in: bool,
    pub is_ready: bool,
}

impl EnginePlayer {
    pub fn is_active_candidate(&self) -> bool {
        !self.folded && !self.is_all_in && self.role == SeatRole::Player
    }
    pub fn call_amount(&self, current_bet: Chips) -> Chips {
        (current_bet - self.bet).max(0).min(self.stack)
    }
}

/// The complete per-room runtime state of one hand-in-progress (or between
/// hands). Every field a retained consumer (the replay recorder) might hold
/// onto is owned, not borrowed, so cloning this struct is always a deep
/// copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub game_id: GameId,
    pub game_name: String,
    pub game_type: GameType,
    pub status: GameStatus,

    pub hand_number: Epoch,
    pub stage: Stage,
    pub hand_in_progress: bool,

    pub deck: Deck,
    pub community_cards: Vec<Card>,

    pub pot: Chips,
    pub pots: Vec<PotBreakdown>,

    pub seats: Vec<EnginePlayer>,
    pub dealer_seat_index: Position,

    pub current_bet: Chips,
    pub last_raise_size: Chips,
    pub acted_this_round: HashSet<PlayerId>,
    pub active_player_id: Option<PlayerId>,

    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub max_players: usize,
    pub starting_stack: Chips,

    pub hand_events: Vec<EngineEvent>,
}

impl EngineState {
    pub fn new(
        game_id: GameId,
        game_name: String,
        game_type: GameType,
        small_blind_amount: Chips,
        big_blind_amount: Chips,
        max_players: usize,
        starting_stack: Chips,
    ) -> Self {
        Self {
            game_id,
            game_name,
            game_type,
            status: GameStatus::Waiting,
            hand_number: 0,
            stage: Stage::PreFlop,
            hand_in_progress: false,
            deck: Deck::create(),
            community_cards: Vec::new(),
            pot: 0,
            pots: Vec::new(),
            seats: Vec::new(),
            dealer_seat_index: 0,
            current_bet: 0,
            last_raise_size: big_blind_amount,
            acted_this_round: HashSet::new(),
            active_player_id: None,
            small_blind_amount,
            big_blind_amount,
            max_players,
            starting_stack,
            hand_events: Vec::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&EnginePlayer> {
        self.seats.iter().find(|p| p.id == id)
    }
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut EnginePlayer> {
        self.seats.iter_mut().find(|p| p.id == id)
    }
    pub fn players_in_play(&self) -> impl Iterator<Item = &EnginePlayer> {
        self.seats.iter().filter(|p| p.role == SeatRole::Player)
    }
    pub fn non_folded(&self) -> impl Iterator<Item = &EnginePlayer> {
        self.players_in_play().filter(|p| !p.folded)
    }
    /// Deep-copies this state. `EngineState` derives `Clone`, so this is
    /// equivalent to `.clone()` — kept as a named operation because the
    /// replay recorder and broadcast fan-out call it at every transition
    /// boundary and the name documents *why*, matching the contract that a
    /// retained state is never aliased with a later one.
    pub fn clone_state(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::ID;

    #[test]
    fn new_state_starts_with_no_hand_in_progress() {
        let state = EngineState::new(ID::default(), "table".into(), GameType::Cash, 5, 10, 9, 1000);
        assert!(!state.hand_in_progress);
        assert_eq!(state.hand_number, 0);
        assert_eq!(state.stage, Stage::PreFlop);
    }
}
