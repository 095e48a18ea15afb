use cr_core::GameId;
use cr_gameplay::EngineState;
use cr_gameroom::ReplayFile;
use cr_records::Storage;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// One durable write, queued from inside a room's executor and carried out
/// by the background worker below. Keeps the room lock free of I/O, per
/// the single-writer persistence queue the concurrency model calls for.
enum Job {
    WriteSnapshot(GameId, Box<EngineState>),
    DeleteSnapshot(GameId),
    WriteReplay(GameId, Box<ReplayFile>),
}

/// Cheap, cloneable front for the persistence worker. `ActiveGame`'s
/// `RoomSink::write_snapshot`/`delete_snapshot` calls land here — fire and
/// forget, exactly like `SocketSink::send` does for outbound frames.
#[derive(Clone)]
pub struct PersistenceHandle {
    jobs: UnboundedSender<Job>,
}

impl PersistenceHandle {
    pub fn write_snapshot(&self, game_id: GameId, state: EngineState) {
        let _ = self.jobs.send(Job::WriteSnapshot(game_id, Box::new(state)));
    }
    pub fn delete_snapshot(&self, game_id: GameId) {
        let _ = self.jobs.send(Job::DeleteSnapshot(game_id));
    }
    pub fn write_replay(&self, game_id: GameId, file: ReplayFile) {
        let _ = self.jobs.send(Job::WriteReplay(game_id, Box::new(file)));
    }
}

/// Spawns the worker and returns a handle to it. The worker runs for the
/// lifetime of the process; there is no shutdown signal because pending
/// writes should drain, not be cancelled, on interrupt.
pub fn spawn(storage: Arc<dyn Storage>) -> PersistenceHandle {
    let (tx, rx) = unbounded_channel();
    tokio::spawn(run(storage, rx));
    PersistenceHandle { jobs: tx }
}

async fn run(storage: Arc<dyn Storage>, mut jobs: UnboundedReceiver<Job>) {
    while let Some(job) = jobs.recv().await {
        let result = match job {
            Job::WriteSnapshot(game_id, state) => storage.write_snapshot(game_id, *state).await,
            Job::DeleteSnapshot(game_id) => storage.delete_snapshot(game_id).await,
            Job::WriteReplay(game_id, file) => storage.write_replay_file(game_id, *file).await,
        };
        if let Err(error) = result {
            log::error!("[persistence] durable write failed: {error}");
        }
    }
}
