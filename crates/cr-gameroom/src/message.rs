use cr_gameplay::ActionRequest;
use cr_gameplay::ClientGameState;
use cr_gameplay::EngineEvent;
use cr_core::Chips;
use cr_core::Epoch;
use cr_core::PlayerId;
use cr_core::Position;
use serde::Serialize;

/// Everything the room ever sends to a client socket, tagged the way the
/// wire protocol's `{action, payload}` envelope expects.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    Identified {
        player_id: PlayerId,
        reconnect_token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_game: Option<ClientGameState>,
    },
    GameList {
        games: Vec<GameSummary>,
    },
    GameJoined {
        game_state: ClientGameState,
        #[serde(skip_serializing_if = "Option::is_none")]
        hand_events: Option<Vec<EngineEvent>>,
    },
    /// The central message: sent once per engine event, per viewer, with
    /// that viewer's own visibility rules already applied.
    GameState {
        game_state: ClientGameState,
        event: EngineEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        action_request: Option<ActionRequest>,
    },
    TimeWarning {
        remaining_ms: u64,
    },
    GameOver {
        game_id: cr_core::GameId,
        reason: String,
        standings: Vec<Standing>,
    },
    ChatMessage {
        player_id: PlayerId,
        display_name: String,
        message: String,
        timestamp_millis: u64,
    },
    Error {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    ReplayState {
        position: usize,
        total_entries: usize,
        is_playing: bool,
        speed: f32,
        game_state: ClientGameState,
        #[serde(skip_serializing_if = "Option::is_none")]
        event: Option<EngineEvent>,
        hand_number: Epoch,
        stage: cr_gameplay::Stage,
        #[serde(skip_serializing_if = "Option::is_none")]
        chat: Option<crate::recorder::ChatEntry>,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: PlayerId,
    pub seat_index: Position,
    pub final_stack: Chips,
}

/// One row of the `listGames` response: room configuration plus the
/// current aggregate seat count, not a full `ClientGameState` (no viewer
/// to project cards for).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: cr_core::GameId,
    pub game_name: String,
    pub game_type: cr_gameplay::GameType,
    pub player_count: usize,
    pub max_players: usize,
    pub status: cr_gameplay::GameStatus,
}

/// Matches the literal client-protocol-error vocabulary — never extended ad
/// hoc by a handler, so a client can switch on the string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidAction,
    OutOfTurn,
    InvalidAmount,
    NotInGame,
    GameNotFound,
    GameFull,
    AlreadyInGame,
    NotIdentified,
    InvalidMessage,
}
