//! Socket <-> player <-> game bindings, reconnect-token issuance, and the
//! stable player identity that survives across sessions.

pub mod identity;
pub mod manager;
pub mod token;

pub use identity::PlayerIdentity;
pub use manager::IdentifyError;
pub use manager::Session;
pub use manager::SessionManager;
pub use manager::SocketId;
pub use manager::SocketSink;
pub use token::issue as issue_token;
pub use token::ReconnectToken;
