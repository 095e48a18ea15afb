//! Per-room orchestration sitting on top of `cr-gameplay`'s pure engine:
//! applies transitions to one room at a time, runs the action clock,
//! rotates hands, records everything for replay, and serves replay
//! playback to spectators after the fact. Nothing here opens a socket or
//! touches a database — `cr-hosting` and `cr-records` plug into the
//! `RoomSink` / `ReplaySource` traits.

pub mod active;
pub mod manager;
pub mod message;
pub mod recorder;
pub mod replay_instance;
pub mod replay_manager;
pub mod timer;

pub use active::ActiveGame;
pub use active::ActiveGameError;
pub use active::RoomSink;
pub use manager::GameManager;
pub use manager::ManagerError;
pub use manager::RoomConfig;
pub use message::ErrorCode;
pub use message::GameSummary;
pub use message::ServerMessage;
pub use message::Standing;
pub use recorder::ChatEntry;
pub use recorder::GameConfig;
pub use recorder::Recorder;
pub use recorder::ReplayEntry;
pub use recorder::ReplayFile;
pub use recorder::ReplayPlayer;
pub use recorder::REPLAY_FILE_VERSION;
pub use replay_instance::ReplayInstance;
pub use replay_instance::SpectatorPlayback;
pub use replay_manager::ReplayManager;
pub use replay_manager::ReplayManagerError;
pub use replay_manager::ReplaySource;
pub use timer::ActionTimer;
pub use timer::TimerConfig;
