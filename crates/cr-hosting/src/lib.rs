//! WebSocket transport: bridges `actix-ws` connections to `Lobby::dispatch`,
//! wires the background persistence worker, and assembles the `actix-web`
//! app. Nothing upstream of this crate knows a socket exists.

pub mod app;
pub mod client_message;
pub mod handlers;
pub mod lobby;
pub mod persistence;
pub mod sink;
pub mod socket;

pub use app::build_app;
pub use app::serve;
pub use lobby::Lobby;
pub use persistence::PersistenceHandle;
pub use socket::ConnectionRegistry;
