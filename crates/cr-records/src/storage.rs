use crate::hand::HandRecord;
use crate::participant::Participant;
use crate::play::Play;
use async_trait::async_trait;
use cr_core::GameId;
use cr_gameplay::EngineState;
use cr_gameroom::ReplayFile;
use cr_session::PlayerIdentity;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no snapshot recorded for this game")]
    SnapshotNotFound,
    #[error("no replay file recorded for this game")]
    ReplayNotFound,
    #[error("no identity recorded for this player")]
    IdentityNotFound,
}

/// Every durable write the server makes. Every state-changing write here
/// must be durable before the next client acknowledgement that depends on
/// it — concretely: snapshot after every engine transition, hand/
/// participant/play rows at hand end, replay files at game end, identities
/// on first `identify`. The storage engine behind this trait is
/// deliberately out of scope for this crate; `InMemoryStorage` below is the
/// only implementation, good enough for tests and a single-process
/// deployment.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_identity(&self, identity: PlayerIdentity) -> Result<(), StorageError>;
    async fn load_identity(&self, player_id: cr_core::PlayerId) -> Result<PlayerIdentity, StorageError>;

    async fn create_hand(&self, hand: HandRecord) -> Result<(), StorageError>;
    async fn create_participant(&self, participant: Participant) -> Result<(), StorageError>;
    async fn create_play(&self, play: Play) -> Result<(), StorageError>;

    /// Replaces the single crash-recovery snapshot row for `game_id`.
    async fn write_snapshot(&self, game_id: GameId, state: EngineState) -> Result<(), StorageError>;
    async fn read_snapshot(&self, game_id: GameId) -> Result<EngineState, StorageError>;
    /// Deleted once the game reaches `Completed` — a finished room never
    /// needs crash recovery again.
    async fn delete_snapshot(&self, game_id: GameId) -> Result<(), StorageError>;

    async fn write_replay_file(&self, game_id: GameId, file: ReplayFile) -> Result<(), StorageError>;
    async fn read_replay_file(&self, game_id: GameId) -> Result<ReplayFile, StorageError>;
}

/// In-process `Storage` backed by plain `HashMap`s behind a handful of
/// mutexes. Loses everything on restart — fine for tests and for a single
/// node that doesn't need crash recovery across process restarts; swap in
/// a real backend by implementing `Storage` against it.
#[derive(Default)]
pub struct InMemoryStorage {
    identities: Mutex<HashMap<cr_core::PlayerId, PlayerIdentity>>,
    hands: Mutex<Vec<HandRecord>>,
    participants: Mutex<Vec<Participant>>,
    plays: Mutex<Vec<Play>>,
    snapshots: Mutex<HashMap<GameId, EngineState>>,
    replays: Mutex<HashMap<GameId, ReplayFile>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn hand_count(&self) -> usize {
        self.hands.lock().expect("storage lock poisoned").len()
    }
}

/// `cr-gameroom`'s replay loader is synchronous (it runs off the same
/// executor that serves the room), while `Storage` is async to leave room
/// for a real I/O-bound backend. `InMemoryStorage` never actually awaits
/// anything, so it can satisfy both directly off the same map.
impl cr_gameroom::ReplaySource for InMemoryStorage {
    fn load(&self, game_id: GameId) -> Option<ReplayFile> {
        self.replays.lock().expect("storage lock poisoned").get(&game_id).cloned()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_identity(&self, identity: PlayerIdentity) -> Result<(), StorageError> {
        self.identities
            .lock()
            .expect("storage lock poisoned")
            .insert(identity.id, identity);
        Ok(())
    }
    async fn load_identity(&self, player_id: cr_core::PlayerId) -> Result<PlayerIdentity, StorageError> {
        self.identities
            .lock()
            .expect("storage lock poisoned")
            .get(&player_id)
            .cloned()
            .ok_or(StorageError::IdentityNotFound)
    }

    async fn create_hand(&self, hand: HandRecord) -> Result<(), StorageError> {
        self.hands.lock().expect("storage lock poisoned").push(hand);
        Ok(())
    }
    async fn create_participant(&self, participant: Participant) -> Result<(), StorageError> {
        self.participants.lock().expect("storage lock poisoned").push(participant);
        Ok(())
    }
    async fn create_play(&self, play: Play) -> Result<(), StorageError> {
        self.plays.lock().expect("storage lock poisoned").push(play);
        Ok(())
    }

    async fn write_snapshot(&self, game_id: GameId, state: EngineState) -> Result<(), StorageError> {
        self.snapshots.lock().expect("storage lock poisoned").insert(game_id, state);
        Ok(())
    }
    async fn read_snapshot(&self, game_id: GameId) -> Result<EngineState, StorageError> {
        self.snapshots
            .lock()
            .expect("storage lock poisoned")
            .get(&game_id)
            .cloned()
            .ok_or(StorageError::SnapshotNotFound)
    }
    async fn delete_snapshot(&self, game_id: GameId) -> Result<(), StorageError> {
        self.snapshots.lock().expect("storage lock poisoned").remove(&game_id);
        Ok(())
    }

    async fn write_replay_file(&self, game_id: GameId, file: ReplayFile) -> Result<(), StorageError> {
        self.replays.lock().expect("storage lock poisoned").insert(game_id, file);
        Ok(())
    }
    async fn read_replay_file(&self, game_id: GameId) -> Result<ReplayFile, StorageError> {
        self.replays
            .lock()
            .expect("storage lock poisoned")
            .get(&game_id)
            .cloned()
            .ok_or(StorageError::ReplayNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::ID;

    #[tokio::test]
    async fn a_missing_snapshot_is_reported_not_found() {
        let storage = InMemoryStorage::new();
        let result = storage.read_snapshot(ID::default()).await;
        assert!(matches!(result, Err(StorageError::SnapshotNotFound)));
    }

    #[tokio::test]
    async fn writing_then_reading_a_snapshot_round_trips() {
        let storage = InMemoryStorage::new();
        let game_id: GameId = ID::default();
        let state = EngineState::new(game_id, "t".into(), cr_gameplay::GameType::Cash, 5, 10, 9, 1000);
        storage.write_snapshot(game_id, state.clone()).await.unwrap();
        let read_back = storage.read_snapshot(game_id).await.unwrap();
        assert_eq!(read_back, state);
    }

    #[tokio::test]
    async fn deleting_a_snapshot_makes_it_not_found_again() {
        let storage = InMemoryStorage::new();
        let game_id: GameId = ID::default();
        let state = EngineState::new(game_id, "t".into(), cr_gameplay::GameType::Cash, 5, 10, 9, 1000);
        storage.write_snapshot(game_id, state).await.unwrap();
        storage.delete_snapshot(game_id).await.unwrap();
        assert!(storage.read_snapshot(game_id).await.is_err());
    }

    #[tokio::test]
    async fn hand_records_accumulate() {
        let storage = InMemoryStorage::new();
        let hand = HandRecord::new(ID::default(), ID::default(), 1, Vec::new(), 150, 0);
        storage.create_hand(hand).await.unwrap();
        assert_eq!(storage.hand_count(), 1);
    }
}
