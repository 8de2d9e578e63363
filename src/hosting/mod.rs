//! WebSocket hosting: the HTTP surface, per-connection sessions, the
//! broadcast hub, and the wire protocol.

pub mod handler;
pub mod hub;
pub mod message;
pub mod server;
pub mod session;

pub use handler::Dispatcher;
pub use hub::Hub;
pub use message::ClientMessage;
pub use message::ServerMessage;
pub use server::Server;
pub use session::Connection;
pub use session::Session;
