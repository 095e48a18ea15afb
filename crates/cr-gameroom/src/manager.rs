use crate::active::ActiveGame;
use crate::active::ActiveGameError;
use crate::active::RoomSink;
use crate::timer::TimerConfig;
use cr_core::Chips;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_gameplay::EngineState;
use cr_gameplay::GameType;
use cr_gameplay::SpectatorVisibility;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("no active game for this room")]
    GameNotFound,
    #[error("the game would end mid-hand")]
    WouldEndMidHand,
    #[error(transparent)]
    ActiveGame(#[from] ActiveGameError),
}

#[derive(Clone, Debug)]
pub struct RoomConfig {
    pub game_name: String,
    pub game_type: GameType,
    pub small_blind_amount: Chips,
    pub big_blind_amount: Chips,
    pub max_players: usize,
    pub starting_stack: Chips,
    pub min_players_to_start: usize,
}

/// Process-wide registry of in-memory active games, keyed by room id.
/// Matches the teacher's `Casino` registry shape: a single shared map
/// guarded by one lock, since lookups happen on every inbound message but
/// contention is low (registration is rare compared to per-room traffic).
pub struct GameManager {
    games: Mutex<HashMap<GameId, ActiveGame>>,
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GameManager {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    /// Loads or creates the in-memory `ActiveGame` for a room, returning
    /// `true` if a fresh one was created.
    pub fn activate_game(&self, game_id: GameId, config: RoomConfig) -> bool {
        let mut games = self.games.lock().expect("game manager lock poisoned");
        if games.contains_key(&game_id) {
            return false;
        }
        let state = EngineState::new(
            game_id,
            config.game_name,
            config.game_type,
            config.small_blind_amount,
            config.big_blind_amount,
            config.max_players,
            config.starting_stack,
        );
        games.insert(
            game_id,
            ActiveGame::new(state, config.min_players_to_start, TimerConfig::default()),
        );
        true
    }

    pub fn with_game<R>(
        &self,
        game_id: GameId,
        f: impl FnOnce(&mut ActiveGame) -> R,
    ) -> Result<R, ManagerError> {
        let mut games = self.games.lock().expect("game manager lock poisoned");
        let game = games.get_mut(&game_id).ok_or(ManagerError::GameNotFound)?;
        Ok(f(game))
    }

    /// Engine removal plus session bookkeeping. Seated players mid-hand are
    /// never hard-removed: their disconnect flag is set instead, and the
    /// action timer will default-act them on their turn.
    pub fn remove_player(
        &self,
        game_id: GameId,
        player_id: PlayerId,
    ) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| {
            if game.state().hand_in_progress {
                game.handle_disconnect(player_id);
            } else {
                game.remove_seated_player(player_id);
            }
        })
    }

    /// Defensive cleanup run on every successful `identify`: drops a stale
    /// synthetic spectator seat left behind by a disconnect that hadn't
    /// been processed yet when this player reconnected.
    pub fn prune_stale_spectator(&self, game_id: GameId, player_id: PlayerId) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| game.prune_stale_spectator_seat(player_id))
    }

    /// Admin override: starts the room with whoever is currently ready,
    /// bypassing the configured minimum.
    pub fn force_start_game(
        &self,
        game_id: GameId,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| game.start_next_hand(sink, now_millis))?
            .map_err(ManagerError::from)
    }

    pub fn leave_player(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| game.leave_player(player_id, sink, now_millis))?
            .map_err(ManagerError::from)
    }

    pub fn reveal_cards(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        hand_number: cr_core::Epoch,
        sink: &mut impl RoomSink,
        now_millis: u64,
    ) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| game.reveal_cards(player_id, hand_number, sink, now_millis))?
            .map_err(ManagerError::from)
    }

    pub fn set_spectator_visibility(
        &self,
        game_id: GameId,
        mode: SpectatorVisibility,
    ) -> Result<(), ManagerError> {
        self.with_game(game_id, |game| game.set_spectator_visibility(mode))
    }

    pub fn remove_game(&self, game_id: GameId) {
        self.games.lock().expect("game manager lock poisoned").remove(&game_id);
    }

    /// Removes the room and serializes its recorded hand history into a
    /// `ReplayFile`, or `None` if the room was already gone.
    pub fn finish_game(&self, game_id: GameId, config: crate::recorder::GameConfig) -> Option<crate::recorder::ReplayFile> {
        let game = self.games.lock().expect("game manager lock poisoned").remove(&game_id)?;
        Some(game.finish(config))
    }

    pub fn contains(&self, game_id: GameId) -> bool {
        self.games.lock().expect("game manager lock poisoned").contains_key(&game_id)
    }

    /// All known room ids, for `listGames`-style enumeration.
    pub fn game_ids(&self) -> Vec<GameId> {
        self.games.lock().expect("game manager lock poisoned").keys().copied().collect()
    }
}
