use cr_core::GameId;
use cr_core::PlayerId;
use cr_core::Position;
use cr_gameplay::EngineEvent;
use cr_gameplay::EngineState;
use serde::Deserialize;
use serde::Serialize;

/// One roster entry deduplicated into a replay file's `players` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayPlayer {
    pub player_id: PlayerId,
    pub display_name: String,
    pub seat_index: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEntry {
    Event {
        index: usize,
        timestamp: u64,
        event: EngineEvent,
        engine_state: EngineState,
    },
    Chat {
        index: usize,
        timestamp: u64,
        chat: ChatEntry,
    },
}

impl ReplayEntry {
    pub fn index(&self) -> usize {
        match self {
            ReplayEntry::Event { index, .. } => *index,
            ReplayEntry::Chat { index, .. } => *index,
        }
    }
    pub fn timestamp(&self) -> u64 {
        match self {
            ReplayEntry::Event { timestamp, .. } => *timestamp,
            ReplayEntry::Chat { timestamp, .. } => *timestamp,
        }
    }
    pub fn event_type(&self) -> Option<&EngineEvent> {
        match self {
            ReplayEntry::Event { event, .. } => Some(event),
            ReplayEntry::Chat { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub player_id: PlayerId,
    pub display_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub game_id: GameId,
    pub game_name: String,
    pub small_blind_amount: cr_core::Chips,
    pub big_blind_amount: cr_core::Chips,
    pub max_players: usize,
    pub starting_stack: cr_core::Chips,
}

/// The format a finished game is serialized to and written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFile {
    pub version: u32,
    pub game_config: GameConfig,
    pub players: Vec<ReplayPlayer>,
    pub entries: Vec<ReplayEntry>,
}

pub const REPLAY_FILE_VERSION: u32 = 1;

/// Append-only log of `(event, cloned state)` pairs kept alive for the
/// duration of one active game, mirroring the teacher's `HandContext` but
/// spanning the whole game rather than a single hand so a crash mid-hand
/// can still produce a complete replay of everything recorded so far.
#[derive(Debug, Default)]
pub struct Recorder {
    started_at: Option<u64>,
    players: Vec<ReplayPlayer>,
    entries: Vec<ReplayEntry>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a roster entry; a player who leaves and rejoins
    /// keeps a single dedup'd entry rather than two.
    pub fn upsert_player(&mut self, player: ReplayPlayer) {
        if let Some(existing) = self
            .players
            .iter_mut()
            .find(|p| p.player_id == player.player_id)
        {
            *existing = player;
        } else {
            self.players.push(player);
        }
    }

    pub fn record_event(&mut self, now_millis: u64, event: EngineEvent, engine_state: EngineState) {
        let started_at = *self.started_at.get_or_insert(now_millis);
        self.entries.push(ReplayEntry::Event {
            index: self.entries.len(),
            timestamp: now_millis - started_at,
            event,
            engine_state,
        });
    }

    pub fn record_chat(&mut self, now_millis: u64, chat: ChatEntry) {
        let started_at = *self.started_at.get_or_insert(now_millis);
        self.entries.push(ReplayEntry::Chat {
            index: self.entries.len(),
            timestamp: now_millis - started_at,
            chat,
        });
    }

    pub fn entries(&self) -> &[ReplayEntry] {
        &self.entries
    }

    pub fn finish(self, game_config: GameConfig) -> ReplayFile {
        ReplayFile {
            version: REPLAY_FILE_VERSION,
            game_config,
            players: self.players,
            entries: self.entries,
        }
    }
}
