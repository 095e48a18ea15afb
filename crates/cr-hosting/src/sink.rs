use crate::persistence::PersistenceHandle;
use cr_core::GameId;
use cr_core::PlayerId;
use cr_gameplay::EngineState;
use cr_gameroom::RoomSink;
use cr_gameroom::ServerMessage;
use cr_session::SessionManager;
use cr_session::SocketSink;

/// Bridges `cr-gameroom`'s transport-agnostic `RoomSink` onto the real
/// session/socket/persistence stack for exactly one dispatch call. Built
/// fresh per inbound message rather than held, since the borrows it wraps
/// don't outlive one handler invocation.
pub struct LiveRoomSink<'a, S: SocketSink> {
    game_id: GameId,
    sessions: &'a SessionManager,
    sockets: &'a S,
    persistence: &'a PersistenceHandle,
}

impl<'a, S: SocketSink> LiveRoomSink<'a, S> {
    pub fn new(
        game_id: GameId,
        sessions: &'a SessionManager,
        sockets: &'a S,
        persistence: &'a PersistenceHandle,
    ) -> Self {
        Self {
            game_id,
            sessions,
            sockets,
            persistence,
        }
    }
}

impl<'a, S: SocketSink> RoomSink for LiveRoomSink<'a, S> {
    fn send(&mut self, player_id: PlayerId, message: ServerMessage) {
        self.sessions.send(player_id, message, self.sockets);
    }

    fn write_snapshot(&mut self, state: &EngineState) {
        self.persistence.write_snapshot(self.game_id, state.clone());
    }

    fn delete_snapshot(&mut self) {
        self.persistence.delete_snapshot(self.game_id);
    }
}
