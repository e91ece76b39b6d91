// MIT License - Copyright (c) 2026 Peter Wright
// TPI transport: framing, send/ack engine and connection tasks

pub mod command;
pub mod direct;
pub mod framer;

pub use command::{OutboundCommand, PendingAck, SendEngine};
pub use direct::{Connection, ConnectionHandle};
pub use framer::Framer;

/// Lifecycle of one connection. `Disconnected` after `Connected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        })
    }
}
