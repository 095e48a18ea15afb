//! Hand-history persistence and the `Storage` abstraction every durable
//! write in the server goes through: player identities, per-hand records,
//! crash-recovery snapshots, and finished-game replay files.

pub mod hand;
pub mod participant;
pub mod play;
pub mod storage;

pub use hand::HandRecord;
pub use participant::Participant;
pub use play::Play;
pub use storage::InMemoryStorage;
pub use storage::Storage;
pub use storage::StorageError;
