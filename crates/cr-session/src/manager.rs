use crate::identity::PlayerIdentity;
use crate::token;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_gameroom::ServerMessage;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

/// Opaque handle to a live socket, minted and owned by the transport layer
/// (`cr-hosting`). This crate never reads or writes one — it only keys by
/// it, so swapping the transport never touches this code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u64);

/// Delivers an outbound message to a live socket; implemented by
/// `cr-hosting` against its actual WebSocket connections. Takes `&self`
/// because one registry is shared across every connection's dispatch
/// call concurrently — implementors guard their state with their own
/// interior mutability rather than relying on exclusive access.
pub trait SocketSink {
    fn send(&self, socket_id: SocketId, message: ServerMessage);
    fn close(&self, socket_id: SocketId);
}

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: PlayerIdentity,
    pub socket_id: SocketId,
    pub game_id: Option<GameId>,
    pub last_seen: SystemTime,
    reconnect_token_hash: Vec<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("reconnect token does not match the stored token")]
    StaleToken,
}

struct Registry {
    by_player: HashMap<PlayerId, Session>,
    by_socket: HashMap<SocketId, PlayerId>,
}

/// Maps `playerId -> Session` and the reverse `socket -> playerId`,
/// enforcing the at-most-one-socket-per-player invariant: registering a
/// player who already has a session closes the previous socket first.
pub struct SessionManager {
    registry: Mutex<Registry>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                by_player: HashMap::new(),
                by_socket: HashMap::new(),
            }),
        }
    }

    /// Registers a brand-new player identity on a fresh socket, returning
    /// the plaintext reconnect token to hand back to the client.
    pub fn register_new(
        &self,
        player_id: PlayerId,
        display_name: String,
        socket_id: SocketId,
        sink: &impl SocketSink,
    ) -> String {
        let issued = token::issue();
        let identity = PlayerIdentity::new(player_id, display_name);
        self.insert(identity, socket_id, None, issued.hash.clone(), sink);
        issued.plaintext
    }

    /// Re-identifies an existing player on a (possibly new) socket,
    /// validating the presented reconnect token against the stored hash.
    /// On success, a fresh token is issued and the room binding carries
    /// over. The identity (including its original `created_at`) is
    /// preserved unchanged across the reconnect.
    pub fn reconnect(
        &self,
        player_id: PlayerId,
        presented_token: &str,
        socket_id: SocketId,
        sink: &impl SocketSink,
    ) -> Result<String, IdentifyError> {
        let (identity, game_id, stored_hash) = {
            let registry = self.registry.lock().expect("session manager lock poisoned");
            let session = registry
                .by_player
                .get(&player_id)
                .ok_or(IdentifyError::StaleToken)?;
            (
                session.identity.clone(),
                session.game_id,
                session.reconnect_token_hash.clone(),
            )
        };
        if token::hash(presented_token) != stored_hash {
            return Err(IdentifyError::StaleToken);
        }
        let issued = token::issue();
        self.insert(identity, socket_id, game_id, issued.hash.clone(), sink);
        Ok(issued.plaintext)
    }

    fn insert(
        &self,
        identity: PlayerIdentity,
        socket_id: SocketId,
        game_id: Option<GameId>,
        reconnect_token_hash: Vec<u8>,
        sink: &impl SocketSink,
    ) {
        let mut registry = self.registry.lock().expect("session manager lock poisoned");
        let player_id = identity.id;
        if let Some(previous) = registry.by_player.get(&player_id) {
            let previous_socket = previous.socket_id;
            registry.by_socket.remove(&previous_socket);
            if previous_socket != socket_id {
                sink.close(previous_socket);
            }
        }
        registry.by_socket.insert(socket_id, player_id);
        registry.by_player.insert(
            player_id,
            Session {
                identity,
                socket_id,
                game_id,
                last_seen: SystemTime::now(),
                reconnect_token_hash,
            },
        );
    }

    /// Drops the socket -> player binding for a closed socket, returning
    /// the player id and its current room binding so the caller can run
    /// the disconnect flow. The `Session` itself (identity, reconnect
    /// token hash, game binding) is left in place — disconnecting doesn't
    /// destroy the player, only its live socket, so a later `identify`
    /// with the right reconnect token can still resolve and re-bind it.
    pub fn disconnect(&self, socket_id: SocketId) -> Option<(PlayerId, Option<GameId>)> {
        let mut registry = self.registry.lock().expect("session manager lock poisoned");
        let player_id = registry.by_socket.remove(&socket_id)?;
        let game_id = registry.by_player.get(&player_id).and_then(|s| s.game_id);
        Some((player_id, game_id))
    }

    pub fn set_game_id(&self, player_id: PlayerId, game_id: Option<GameId>) {
        let mut registry = self.registry.lock().expect("session manager lock poisoned");
        if let Some(session) = registry.by_player.get_mut(&player_id) {
            session.game_id = game_id;
        }
    }

    pub fn game_id_of(&self, player_id: PlayerId) -> Option<GameId> {
        self.registry
            .lock()
            .expect("session manager lock poisoned")
            .by_player
            .get(&player_id)
            .and_then(|s| s.game_id)
    }

    pub fn display_name_of(&self, player_id: PlayerId) -> Option<String> {
        self.registry
            .lock()
            .expect("session manager lock poisoned")
            .by_player
            .get(&player_id)
            .map(|s| s.identity.display_name.clone())
    }

    pub fn is_identified(&self, player_id: PlayerId) -> bool {
        self.registry
            .lock()
            .expect("session manager lock poisoned")
            .by_player
            .contains_key(&player_id)
    }

    /// Enqueues an outbound message; drops it silently if the player has no
    /// live socket, matching the "never block the room on a slow client"
    /// contract.
    pub fn send(&self, player_id: PlayerId, message: ServerMessage, sink: &impl SocketSink) {
        let socket_id = self
            .registry
            .lock()
            .expect("session manager lock poisoned")
            .by_player
            .get(&player_id)
            .map(|s| s.socket_id);
        if let Some(socket_id) = socket_id {
            sink.send(socket_id, message);
        }
    }

    pub fn touch(&self, player_id: PlayerId) {
        let mut registry = self.registry.lock().expect("session manager lock poisoned");
        if let Some(session) = registry.by_player.get_mut(&player_id) {
            session.last_seen = SystemTime::now();
        }
    }
}
