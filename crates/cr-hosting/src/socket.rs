use cr_gameroom::ServerMessage;
use cr_session::SocketId;
use cr_session::SocketSink;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Live outbound channel for one socket. The bridge task owns the
/// receiving half and writes each frame to the real WebSocket session;
/// dropping the sender (on `close`) ends that task and closes the socket.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: Mutex<HashMap<SocketId, UnboundedSender<String>>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Mints a fresh socket id and its outbound channel. The caller owns
    /// the receiver and is responsible for draining it into the real
    /// transport.
    pub fn register(&self) -> (SocketId, UnboundedReceiver<String>) {
        let id = SocketId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = unbounded_channel();
        self.connections.lock().expect("connection registry lock poisoned").insert(id, tx);
        (id, rx)
    }

    /// Drops the channel for a socket that closed on its own (client EOF,
    /// read error) without going through `SocketSink::close`.
    pub fn forget(&self, socket_id: SocketId) {
        self.connections.lock().expect("connection registry lock poisoned").remove(&socket_id);
    }
}

impl SocketSink for ConnectionRegistry {
    fn send(&self, socket_id: SocketId, message: ServerMessage) {
        let sender = self
            .connections
            .lock()
            .expect("connection registry lock poisoned")
            .get(&socket_id)
            .cloned();
        if let Some(sender) = sender {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    let _ = sender.send(json);
                }
                Err(error) => log::error!("[socket] failed to serialize outbound message: {error}"),
            }
        }
    }

    fn close(&self, socket_id: SocketId) {
        self.connections.lock().expect("connection registry lock poisoned").remove(&socket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sending_after_close_is_silently_dropped() {
        let registry = ConnectionRegistry::new();
        let (id, mut rx) = registry.register();
        registry.close(id);
        registry.send(id, ServerMessage::TimeWarning { remaining_ms: 1000 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sending_before_close_delivers_the_frame() {
        let registry = ConnectionRegistry::new();
        let (id, mut rx) = registry.register();
        registry.send(id, ServerMessage::TimeWarning { remaining_ms: 1000 });
        assert!(rx.try_recv().is_ok());
    }
}
