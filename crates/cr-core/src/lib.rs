//! Core type aliases, identifiers, and runtime utilities.
//!
//! This crate provides the foundational types shared by every other member
//! of the room-server workspace: chip/seat type aliases, the phantom-typed
//! `ID<T>` identifier, and small process-lifecycle helpers (logging init,
//! graceful shutdown) used by the server binary.
#![allow(dead_code)]

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Chip amounts: stacks, bets, pots. Signed so intermediate arithmetic
/// (e.g. pot remainders) never needs a checked-subtraction dance.
pub type Chips = i64;
/// Seat index around a table, 0-based.
pub type Position = usize;
/// Monotonically increasing sequence number (hand numbers, action indices).
pub type Epoch = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use serde::Deserialize;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;
use std::str::FromStr;

/// Generic ID wrapper providing compile-time type safety over `uuid::Uuid`.
///
/// `ID<PlayerIdentity>` and `ID<GameRoom>` are distinct types even though
/// both wrap a `Uuid`, so a room id can never be passed where a player id is
/// expected.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast `ID<T>` to `ID<U>` while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> FromStr for ID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self::from)
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// DOMAIN ID MARKERS
// ============================================================================
/// Marker type for `ID<Player>` — lets `cr-session` and `cr-gameplay` share a
/// player-identifier type without either crate depending on the other (the
/// same trick the teacher uses for its `records::room::Room` marker).
pub struct Player;
/// Marker type for `ID<Game>`, shared by `cr-gameroom` and `cr-gameplay`.
pub struct Game;
/// Marker type for `ID<Hand>`, shared by `cr-records` and `cr-gameroom`.
pub struct Hand;

pub type PlayerId = ID<Player>;
pub type GameId = ID<Game>;
pub type HandId = ID<Hand>;

// ============================================================================
// ROOM / HAND PARAMETERS
// ============================================================================
/// Default number of seats at a cash table.
pub const DEFAULT_MAX_PLAYERS: usize = 9;
/// Default starting stack, in chips, for a freshly created room.
pub const DEFAULT_STARTING_STACK: Chips = 1000;
/// Default small blind.
pub const DEFAULT_SMALL_BLIND: Chips = 5;
/// Default big blind.
pub const DEFAULT_BIG_BLIND: Chips = 10;
/// Time a player is given to act before the server submits a default action.
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;
/// Remaining-time thresholds (ms) at which a `timeWarning` is sent to the
/// active player.
pub const TIME_WARNING_THRESHOLDS_MS: [u64; 2] = [10_000, 5_000];
/// Delay between `HAND_END` and the next `HAND_START`, so clients can
/// animate the pot award before the board resets.
pub const DEFAULT_HAND_DELAY_MS: u64 = 3_000;
/// Minimum replay playback speed multiplier.
pub const REPLAY_SPEED_MIN: f32 = 0.25;
/// Maximum replay playback speed multiplier.
pub const REPLAY_SPEED_MAX: f32 = 10.0;
/// Floor on the computed inter-entry replay tick, regardless of speed.
pub const REPLAY_TICK_FLOOR_MS: u64 = 50;
/// Bounded size of a per-socket outbound send queue before it is treated as
/// disconnected.
pub const SEND_QUEUE_CAPACITY: usize = 256;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates a `logs/` directory and writes DEBUG level to file, INFO to
/// terminal.
#[cfg(feature = "server")]
pub fn init_logging() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Global interrupt flag for graceful shutdown coordination.
#[cfg(feature = "server")]
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if a graceful shutdown was requested via Ctrl+C.
#[cfg(feature = "server")]
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}

/// Register a Ctrl+C handler that flips the graceful-shutdown flag. Rooms
/// poll `interrupted()` between hands so an in-progress hand is allowed to
/// finish (and pots to settle) before the process exits.
#[cfg(feature = "server")]
pub fn register_interrupt_handler() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing in-progress hands before exit");
            INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Foo;
    struct Bar;

    #[test]
    fn ids_of_different_types_do_not_collide_by_value() {
        let raw = uuid::Uuid::now_v7();
        let foo: ID<Foo> = ID::from(raw);
        let bar: ID<Bar> = foo.cast::<Bar>();
        assert_eq!(foo.inner(), bar.inner());
    }

    #[test]
    fn default_ids_are_unique() {
        let a: ID<Foo> = ID::default();
        let b: ID<Foo> = ID::default();
        assert_ne!(a, b);
    }

    #[test]
    fn id_round_trips_through_string() {
        let a: ID<Foo> = ID::default();
        let s = a.to_string();
        let b: ID<Foo> = s.parse().unwrap();
        assert_eq!(a, b);
    }
}
