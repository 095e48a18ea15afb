use crate::client_message::ClientMessage;
use crate::client_message::ReplayCommand;
use crate::client_message::SeatRoleRequest;
use crate::persistence::PersistenceHandle;
use crate::sink::LiveRoomSink;
use crate::socket::ConnectionRegistry;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_gameplay::to_client_game_state;
use cr_gameroom::ActiveGameError;
use cr_gameroom::ErrorCode;
use cr_gameroom::GameManager;
use cr_gameroom::GameSummary;
use cr_gameroom::ManagerError;
use cr_gameroom::ReplayManager;
use cr_gameroom::ReplayManagerError;
use cr_gameroom::RoomConfig;
use cr_gameroom::ServerMessage;
use cr_gameroom::Standing;
use cr_records::InMemoryStorage;
use cr_session::IdentifyError;
use cr_session::SessionManager;
use cr_session::SocketId;
use cr_session::SocketSink;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// The whole server's shared, process-wide state: the session directory,
/// the active-game registry, the replay cache, and the cold-room catalog
/// rooms live in before anyone has joined them. One instance is wrapped in
/// `web::Data` and shared across every connection task.
pub struct Lobby {
    pub sessions: SessionManager,
    pub games: GameManager,
    pub replays: ReplayManager,
    pub storage: Arc<InMemoryStorage>,
    pub persistence: PersistenceHandle,
    /// The one registry every socket registers into and every `dispatch`
    /// call sends through, regardless of which connection received the
    /// inbound frame that triggered the outbound one.
    pub sockets: ConnectionRegistry,
    rooms: Mutex<HashMap<GameId, RoomConfig>>,
}

impl Lobby {
    pub fn new(storage: Arc<InMemoryStorage>) -> Self {
        let persistence = crate::persistence::spawn(storage.clone() as Arc<dyn cr_records::Storage>);
        Self {
            sessions: SessionManager::new(),
            games: GameManager::new(),
            replays: ReplayManager::new(),
            storage,
            persistence,
            sockets: ConnectionRegistry::new(),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a cold room, the way an admin or matchmaking endpoint
    /// would ahead of any player connecting. The engine doesn't activate
    /// until the first `joinGame`.
    pub fn create_room(&self, config: RoomConfig) -> GameId {
        let game_id = GameId::default();
        self.rooms.lock().expect("room catalog lock poisoned").insert(game_id, config);
        game_id
    }

    fn room_config(&self, game_id: GameId) -> Option<RoomConfig> {
        self.rooms.lock().expect("room catalog lock poisoned").get(&game_id).cloned()
    }

    fn list_summaries(&self) -> Vec<GameSummary> {
        self.rooms
            .lock()
            .expect("room catalog lock poisoned")
            .iter()
            .map(|(&game_id, config)| {
                let (player_count, status) = self
                    .games
                    .with_game(game_id, |game| (game.state().players_in_play().count(), game.state().status))
                    .unwrap_or((0, cr_gameplay::GameStatus::Waiting));
                GameSummary {
                    game_id,
                    game_name: config.game_name.clone(),
                    game_type: config.game_type,
                    player_count,
                    max_players: config.max_players,
                    status,
                }
            })
            .collect()
    }

    /// Entry point for every inbound frame on a socket. `player_id` is
    /// `None` until the first successful `identify`; any other action
    /// arriving before that gets `NOT_IDENTIFIED`, and a rejected
    /// reconnect leaves it `None` so the client can retry without one.
    pub fn dispatch(
        &self,
        player_id: Option<PlayerId>,
        socket_id: SocketId,
        message: ClientMessage,
        sockets: &impl SocketSink,
    ) -> Option<PlayerId> {
        if let ClientMessage::Identify { display_name, reconnect_token } = message {
            return self.handle_identify(display_name, reconnect_token, socket_id, sockets);
        }
        let Some(player_id) = player_id else {
            self.send_error(socket_id, sockets, ErrorCode::NotIdentified, "send identify before any other action");
            return None;
        };
        self.handle_identified(player_id, socket_id, message, sockets);
        Some(player_id)
    }

    /// The `reconnectToken` the client echoes back is opaque to it but
    /// encodes `playerId.secret` on our side, so the single-field wire
    /// contract (`identify {displayName, reconnectToken?}`, no separate
    /// player id) still lets the session manager look sessions up by id.
    fn handle_identify(
        &self,
        display_name: String,
        reconnect_token: Option<String>,
        socket_id: SocketId,
        sockets: &impl SocketSink,
    ) -> Option<PlayerId> {
        let presented = reconnect_token.as_deref().and_then(decode_reconnect_token);
        let (player_id, token, is_reconnect) = if let Some((player_id, secret)) = presented {
            match self.sessions.reconnect(player_id, &secret, socket_id, sockets) {
                Ok(fresh) => (player_id, fresh, true),
                Err(IdentifyError::StaleToken) => {
                    self.send_error(socket_id, sockets, ErrorCode::NotIdentified, "stale reconnect token, retry without one");
                    return None;
                }
            }
        } else {
            let player_id = PlayerId::default();
            let fresh = self.sessions.register_new(player_id, display_name, socket_id, sockets);
            (player_id, fresh, false)
        };
        let game_id = self.sessions.game_id_of(player_id);
        if is_reconnect {
            if let Some(game_id) = game_id {
                let _ = self.games.prune_stale_spectator(game_id, player_id);
            }
        }
        let current_game = game_id.and_then(|game_id| {
            self.games
                .with_game(game_id, |game| to_client_game_state(game.state(), player_id, game.spectator_visibility()))
                .ok()
        });
        sockets.send(
            socket_id,
            ServerMessage::Identified { player_id, reconnect_token: format!("{player_id}.{token}"), current_game },
        );
        Some(player_id)
    }

    fn handle_identified(&self, player_id: PlayerId, socket_id: SocketId, message: ClientMessage, sockets: &impl SocketSink) {
        self.sessions.touch(player_id);
        let now_millis = now_millis();
        match message {
            ClientMessage::Identify { .. } => unreachable!("handled in dispatch"),
            ClientMessage::ListGames {} => {
                sockets.send(socket_id, ServerMessage::GameList { games: self.list_summaries() });
            }
            ClientMessage::JoinGame { game_id, role } => {
                self.handle_join(player_id, game_id, role, socket_id, sockets, now_millis)
            }
            ClientMessage::Ready {} => self.handle_ready(player_id, socket_id, sockets, now_millis),
            ClientMessage::PlayerAction { hand_number, kind, amount } => {
                self.handle_player_action(player_id, hand_number, kind, amount, socket_id, sockets, now_millis)
            }
            ClientMessage::RevealCards { hand_number } => self.handle_reveal(player_id, hand_number, socket_id, sockets, now_millis),
            ClientMessage::Chat { message } => self.handle_chat(player_id, message, socket_id, sockets, now_millis),
            ClientMessage::LeaveGame {} => self.handle_leave(player_id, socket_id, sockets, now_millis),
            ClientMessage::ReplayControl { command, speed, position } => {
                self.handle_replay_control(player_id, command, speed, position, socket_id, sockets)
            }
            ClientMessage::ReplayCardVisibility { show_all_cards, player_visibility } => {
                self.handle_replay_visibility(player_id, show_all_cards, player_visibility, socket_id, sockets)
            }
        }
    }

    fn handle_join(
        &self,
        player_id: PlayerId,
        game_id: GameId,
        role: SeatRoleRequest,
        socket_id: SocketId,
        sockets: &impl SocketSink,
        now_millis: u64,
    ) {
        let Some(config) = self.room_config(game_id) else {
            self.send_error(socket_id, sockets, ErrorCode::GameNotFound, "no room with this id");
            return;
        };
        self.games.activate_game(game_id, config);
        let display_name = self.sessions.display_name_of(player_id).unwrap_or_else(|| "player".into());
        let outcome = self.games.with_game(game_id, |game| {
            let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
            match role {
                SeatRoleRequest::Player => game.join_player(player_id, display_name, &mut sink, now_millis),
                SeatRoleRequest::Spectator => {
                    game.join_spectator(player_id, display_name, &mut sink);
                    Ok(())
                }
            }
        });
        match outcome {
            Ok(Ok(())) => self.sessions.set_game_id(player_id, Some(game_id)),
            Ok(Err(error)) => self.send_active_game_error(socket_id, sockets, error),
            Err(error) => self.send_manager_error(socket_id, sockets, error),
        }
    }

    fn handle_ready(&self, player_id: PlayerId, socket_id: SocketId, sockets: &impl SocketSink, now_millis: u64) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let outcome = self.games.with_game(game_id, |game| {
            game.mark_ready(player_id);
            if game.should_auto_start() {
                let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
                game.start_next_hand(&mut sink, now_millis)
            } else {
                Ok(())
            }
        });
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.send_active_game_error(socket_id, sockets, error),
            Err(error) => self.send_manager_error(socket_id, sockets, error),
        }
    }

    fn handle_player_action(
        &self,
        player_id: PlayerId,
        hand_number: cr_core::Epoch,
        kind: cr_gameplay::ActionKind,
        amount: Option<cr_core::Chips>,
        socket_id: SocketId,
        sockets: &impl SocketSink,
        now_millis: u64,
    ) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        match self.games.with_game(game_id, |game| game.state().hand_number) {
            Ok(current) if current == hand_number => {}
            Ok(_) => {
                self.send_error(socket_id, sockets, ErrorCode::InvalidAction, "hand number does not match the active hand");
                return;
            }
            Err(error) => {
                self.send_manager_error(socket_id, sockets, error);
                return;
            }
        }
        let outcome = self.games.with_game(game_id, |game| {
            let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
            game.apply_player_action(player_id, kind, amount, &mut sink, now_millis)
        });
        match outcome {
            Ok(Ok(())) => self.finish_if_over(game_id, sockets),
            Ok(Err(error)) => self.send_active_game_error(socket_id, sockets, error),
            Err(error) => self.send_manager_error(socket_id, sockets, error),
        }
    }

    fn handle_reveal(&self, player_id: PlayerId, hand_number: cr_core::Epoch, socket_id: SocketId, sockets: &impl SocketSink, now_millis: u64) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
        if let Err(error) = self.games.reveal_cards(game_id, player_id, hand_number, &mut sink, now_millis) {
            self.send_manager_error(socket_id, sockets, error);
        }
    }

    fn handle_chat(&self, player_id: PlayerId, message: String, socket_id: SocketId, sockets: &impl SocketSink, now_millis: u64) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let display_name = self
            .games
            .with_game(game_id, |game| game.state().player(player_id).map(|p| p.display_name.clone()))
            .ok()
            .flatten();
        let Some(display_name) = display_name else {
            return;
        };
        let _ = self.games.with_game(game_id, |game| {
            let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
            game.broadcast_chat(cr_gameroom::ChatEntry { player_id, display_name, message }, &mut sink, now_millis);
        });
    }

    fn handle_leave(&self, player_id: PlayerId, socket_id: SocketId, sockets: &impl SocketSink, now_millis: u64) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let outcome = {
            let mut sink = LiveRoomSink::new(game_id, &self.sessions, sockets, &self.persistence);
            self.games.leave_player(game_id, player_id, &mut sink, now_millis)
        };
        self.sessions.set_game_id(player_id, None);
        if let Err(error) = outcome {
            self.send_manager_error(socket_id, sockets, error);
        } else {
            self.finish_if_over(game_id, sockets);
        }
    }

    fn handle_replay_control(
        &self,
        player_id: PlayerId,
        command: ReplayCommand,
        speed: Option<f32>,
        position: Option<usize>,
        socket_id: SocketId,
        sockets: &impl SocketSink,
    ) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let result = self.replays.with_replay(game_id, self.storage.as_ref(), |instance| {
            match command {
                ReplayCommand::Play => instance.play(player_id),
                ReplayCommand::Pause => instance.pause(player_id),
                ReplayCommand::StepForward => instance.step_forward(player_id),
                ReplayCommand::StepBackward => instance.step_backward(player_id),
                ReplayCommand::JumpRoundStart => instance.jump_round_start(player_id),
                ReplayCommand::JumpNextRound => instance.jump_next_round(player_id),
                ReplayCommand::SetSpeed => instance.set_speed(player_id, speed.unwrap_or(1.0)),
                ReplayCommand::SetPosition => instance.set_position(player_id, position.unwrap_or(0)),
            }
            instance.render(player_id)
        });
        self.send_replay_result(socket_id, sockets, result);
    }

    fn handle_replay_visibility(
        &self,
        player_id: PlayerId,
        show_all_cards: Option<bool>,
        player_visibility: Option<HashMap<PlayerId, bool>>,
        socket_id: SocketId,
        sockets: &impl SocketSink,
    ) {
        let Some(game_id) = self.sessions.game_id_of(player_id) else {
            self.not_in_game(socket_id, sockets);
            return;
        };
        let result = self.replays.with_replay(game_id, self.storage.as_ref(), |instance| {
            instance.set_card_visibility(player_id, show_all_cards.unwrap_or(false), player_visibility.unwrap_or_default());
            instance.render(player_id)
        });
        self.send_replay_result(socket_id, sockets, result);
    }

    fn send_replay_result(&self, socket_id: SocketId, sockets: &impl SocketSink, result: Result<Option<ServerMessage>, ReplayManagerError>) {
        match result {
            Ok(Some(message)) => sockets.send(socket_id, message),
            Ok(None) => {}
            Err(_) => self.send_error(socket_id, sockets, ErrorCode::GameNotFound, "no replay is available for this room"),
        }
    }

    /// Ends the room once fewer than two seats retain chips: notifies every
    /// seat, serializes the recorded history, and tears the engine down.
    fn finish_if_over(&self, game_id: GameId, sockets: &impl SocketSink) {
        let is_over = self.games.with_game(game_id, |game| game.should_end_game()).unwrap_or(false);
        if !is_over {
            return;
        }
        let Some(config) = self.room_config(game_id) else {
            return;
        };
        let Ok(standings) = self.games.with_game(game_id, |game| {
            game.state()
                .seats
                .iter()
                .filter(|p| p.role == cr_gameplay::SeatRole::Player)
                .map(|p| Standing { player_id: p.id, seat_index: p.seat_index, final_stack: p.stack })
                .collect::<Vec<_>>()
        }) else {
            return;
        };
        for standing in &standings {
            self.sessions.send(
                standing.player_id,
                ServerMessage::GameOver { game_id, reason: "insufficient players remain".into(), standings: standings.clone() },
                sockets,
            );
        }
        let game_config = cr_gameroom::GameConfig {
            game_id,
            game_name: config.game_name,
            small_blind_amount: config.small_blind_amount,
            big_blind_amount: config.big_blind_amount,
            max_players: config.max_players,
            starting_stack: config.starting_stack,
        };
        if let Some(replay_file) = self.games.finish_game(game_id, game_config) {
            self.persistence.write_replay(game_id, replay_file);
        }
        self.rooms.lock().expect("room catalog lock poisoned").remove(&game_id);
    }

    fn not_in_game(&self, socket_id: SocketId, sockets: &impl SocketSink) {
        self.send_error(socket_id, sockets, ErrorCode::NotInGame, "you are not seated in a room");
    }

    fn send_error(&self, socket_id: SocketId, sockets: &impl SocketSink, code: ErrorCode, message: &str) {
        sockets.send(socket_id, ServerMessage::Error { code, message: message.to_string(), details: None });
    }

    fn send_active_game_error(&self, socket_id: SocketId, sockets: &impl SocketSink, error: ActiveGameError) {
        let code = match &error {
            ActiveGameError::GameFull => ErrorCode::GameFull,
            ActiveGameError::AlreadyInGame => ErrorCode::AlreadyInGame,
            ActiveGameError::Engine(inner) => match inner {
                cr_gameplay::EngineError::OutOfTurn => ErrorCode::OutOfTurn,
                cr_gameplay::EngineError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
                _ => ErrorCode::InvalidAction,
            },
        };
        self.send_error(socket_id, sockets, code, &error.to_string());
    }

    fn send_manager_error(&self, socket_id: SocketId, sockets: &impl SocketSink, error: ManagerError) {
        match error {
            ManagerError::GameNotFound => self.send_error(socket_id, sockets, ErrorCode::GameNotFound, &error.to_string()),
            ManagerError::WouldEndMidHand => self.send_error(socket_id, sockets, ErrorCode::InvalidAction, &error.to_string()),
            ManagerError::ActiveGame(inner) => self.send_active_game_error(socket_id, sockets, inner),
        }
    }

    /// A socket closed. Mirrors the session manager's own disconnect
    /// policy: seated players stay seated, spectators leave immediately.
    pub fn handle_disconnect(&self, socket_id: SocketId) {
        let Some((player_id, game_id)) = self.sessions.disconnect(socket_id) else {
            return;
        };
        if let Some(game_id) = game_id {
            let _ = self.games.remove_player(game_id, player_id);
        }
    }
}

fn decode_reconnect_token(combined: &str) -> Option<(PlayerId, String)> {
    let (id_part, secret_part) = combined.split_once('.')?;
    let player_id: PlayerId = id_part.parse().ok()?;
    Some((player_id, secret_part.to_string()))
}

fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
